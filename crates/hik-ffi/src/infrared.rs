//! Interface to the infrared temperature reader.
//!
//! Thermal readings come from a separate device API that authenticates on
//! its own; a session only forwards the device address and credentials.

use hik_types::Temperature;
use thiserror::Error;

/// Failure reported by an infrared reader.
#[derive(Debug, Error)]
pub enum InfraredError {
    /// The device rejected the credentials.
    #[error("Authentication rejected by {0}")]
    Unauthorized(String),

    /// The device answered but the payload could not be used.
    #[error("Invalid thermometry response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure.
    #[error("Thermometry request failed: {0}")]
    Transport(String),
}

/// Reads min/max/average temperature statistics from a device.
pub trait InfraredReader: Send {
    fn read_temperature(
        &self,
        ip: &str,
        username: &str,
        password: &str,
    ) -> Result<Temperature, InfraredError>;
}

impl<F> InfraredReader for F
where
    F: Fn(&str, &str, &str) -> Result<Temperature, InfraredError> + Send,
{
    fn read_temperature(
        &self,
        ip: &str,
        username: &str,
        password: &str,
    ) -> Result<Temperature, InfraredError> {
        self(ip, username, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_reader() {
        let reader = |ip: &str, user: &str, _pass: &str| {
            if user == "admin" {
                Ok(Temperature::new(18.0, 41.5, 25.0))
            } else {
                Err(InfraredError::Unauthorized(ip.to_string()))
            }
        };

        assert_eq!(
            reader.read_temperature("10.0.0.5", "admin", "pass").unwrap(),
            Temperature::new(18.0, 41.5, 25.0)
        );
        let err = reader.read_temperature("10.0.0.5", "guest", "pass").unwrap_err();
        assert_eq!(err.to_string(), "Authentication rejected by 10.0.0.5");
    }
}
