//! Session configuration, state and call outcome types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default SDK service port on Hikvision devices.
pub const DEFAULT_PORT: u16 = 8000;

/// Default video channel.
pub const DEFAULT_CHANNEL: i32 = 1;

/// Connection parameters for one camera session.
///
/// Construction performs no native calls; the values are only consumed when
/// the session is initialized.
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding the vendor library and its sibling resources.
    pub lib_dir: PathBuf,

    /// Device address (IP or hostname).
    pub ip: String,

    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,

    /// SDK service port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Video channel used for capture and configuration calls.
    #[serde(default = "default_channel")]
    pub channel: i32,

    /// Verbose step logging when true, informational only otherwise.
    #[serde(default = "default_true")]
    pub debug: bool,
}

fn default_port() -> u16 { DEFAULT_PORT }
fn default_channel() -> i32 { DEFAULT_CHANNEL }
fn default_true() -> bool { true }

impl SessionConfig {
    /// Create a config with default port, channel and debug logging.
    pub fn new(
        lib_dir: impl Into<PathBuf>,
        ip: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            lib_dir: lib_dir.into(),
            ip: ip.into(),
            username: username.into(),
            password: password.into(),
            port: DEFAULT_PORT,
            channel: DEFAULT_CHANNEL,
            debug: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_channel(mut self, channel: i32) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Check the fields that can be validated without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ip.trim().is_empty() {
            return Err(ConfigError::Missing("ip"));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Missing("username"));
        }
        if self.lib_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("lib_dir"));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port",
                message: "must be non-zero".to_string(),
            });
        }
        if self.channel < 1 {
            return Err(ConfigError::InvalidValue {
                field: "channel",
                message: format!("channels are 1-based (got {})", self.channel),
            });
        }
        Ok(())
    }
}

// Keeps the password out of logs.
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("lib_dir", &self.lib_dir)
            .field("ip", &self.ip)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .field("channel", &self.channel)
            .field("debug", &self.debug)
            .finish()
    }
}

/// Invalid session configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required field '{0}'")]
    Missing(&'static str),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Constructed; no native call made yet.
    Uninitialized,
    /// Library initialized and user logged in.
    Ready,
    /// Native initialization or library loading failed.
    Faulted,
    /// Torn down. Terminal.
    Closed,
}

impl SessionState {
    /// Whether operations may touch the native handle.
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// What to do with the session after an operation completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Release {
    /// Log out, clean up the SDK and restore the working directory.
    #[default]
    Teardown,
    /// Leave the session logged in for further calls.
    Keep,
}

impl Release {
    pub fn tears_down(self) -> bool {
        self == Self::Teardown
    }
}

impl From<bool> for Release {
    fn from(release_resources: bool) -> Self {
        if release_resources {
            Self::Teardown
        } else {
            Self::Keep
        }
    }
}

/// Result of a soft-failing session operation.
///
/// Separates "never logged in" from "the native call failed", which a plain
/// boolean cannot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CallOutcome<T> {
    /// Session not logged in; no native call was made.
    NotReady,
    /// The native call reported failure. `code` is the SDK last-error value
    /// when it was queried.
    Failed { code: Option<u32> },
    /// The call succeeded.
    Succeeded(T),
}

impl<T> CallOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// SDK error code attached to a failure, if any.
    pub fn error_code(&self) -> Option<u32> {
        match self {
            Self::Failed { code } => *code,
            _ => None,
        }
    }

    /// Convert into an `Option`, discarding the failure kind.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        match self {
            Self::NotReady => CallOutcome::NotReady,
            Self::Failed { code } => CallOutcome::Failed { code },
            Self::Succeeded(value) => CallOutcome::Succeeded(f(value)),
        }
    }
}

impl CallOutcome<f32> {
    /// Sentinel view of a zoom read: the level, `-1.0` after a native
    /// failure, `0.0` when the session was never ready.
    pub fn legacy_zoom(&self) -> f32 {
        match self {
            Self::Succeeded(level) => *level,
            Self::Failed { .. } => -1.0,
            Self::NotReady => 0.0,
        }
    }
}

impl<T> From<CallOutcome<T>> for bool {
    fn from(outcome: CallOutcome<T>) -> Self {
        outcome.is_success()
    }
}

/// Infrared temperature statistics reported by the device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Temperature {
    pub min: f32,
    pub max: f32,
    pub average: f32,
}

impl Temperature {
    /// Returned when the reading could not be obtained.
    pub const UNAVAILABLE: Temperature = Temperature {
        min: -1.0,
        max: -1.0,
        average: -1.0,
    };

    pub fn new(min: f32, max: f32, average: f32) -> Self {
        Self { min, max, average }
    }

    pub fn is_available(&self) -> bool {
        *self != Self::UNAVAILABLE
    }

    /// `(min, max, average)` tuple view.
    pub fn as_tuple(&self) -> (f32, f32, f32) {
        (self.min, self.max, self.average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_toml() {
        let config: SessionConfig = toml::from_str(
            r#"
            lib_dir = "/opt/hcnet"
            ip = "10.0.0.5"
            username = "admin"
            password = "pass"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.channel, 1);
        assert!(config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json_overrides() {
        let config: SessionConfig = serde_json::from_str(
            r#"{"lib_dir": "lib", "ip": "cam.local", "username": "u",
                "password": "p", "port": 8001, "channel": 2, "debug": false}"#,
        )
        .unwrap();

        assert_eq!(config.port, 8001);
        assert_eq!(config.channel, 2);
        assert!(!config.debug);
    }

    #[test]
    fn test_config_validation() {
        let base = SessionConfig::new("/opt/hcnet", "10.0.0.5", "admin", "pass");
        assert!(base.validate().is_ok());

        assert_eq!(
            base.clone().with_channel(0).validate(),
            Err(ConfigError::InvalidValue {
                field: "channel",
                message: "channels are 1-based (got 0)".to_string(),
            })
        );
        assert!(base.clone().with_port(0).validate().is_err());

        let mut no_ip = base;
        no_ip.ip = "  ".to_string();
        assert_eq!(no_ip.validate(), Err(ConfigError::Missing("ip")));
    }

    #[test]
    fn test_config_debug_hides_password() {
        let config = SessionConfig::new("/opt/hcnet", "10.0.0.5", "admin", "s3cret");
        let printed = format!("{config:?}");
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("10.0.0.5"));
    }

    #[test]
    fn test_release_default_tears_down() {
        assert_eq!(Release::default(), Release::Teardown);
        assert_eq!(Release::from(false), Release::Keep);
        assert!(Release::from(true).tears_down());
    }

    #[test]
    fn test_call_outcome_views() {
        let ok: CallOutcome<f32> = CallOutcome::Succeeded(4.0);
        let failed: CallOutcome<f32> = CallOutcome::Failed { code: Some(23) };
        let not_ready: CallOutcome<f32> = CallOutcome::NotReady;

        assert_eq!(ok.legacy_zoom(), 4.0);
        assert_eq!(failed.legacy_zoom(), -1.0);
        assert_eq!(not_ready.legacy_zoom(), 0.0);

        assert_eq!(failed.error_code(), Some(23));
        assert!(not_ready.is_not_ready());
        assert!(bool::from(ok));
        assert!(!bool::from(failed));
        assert_eq!(ok.map(|z| z as i32).ok(), Some(4));
    }

    #[test]
    fn test_temperature_unavailable() {
        assert!(!Temperature::UNAVAILABLE.is_available());
        assert_eq!(Temperature::UNAVAILABLE.as_tuple(), (-1.0, -1.0, -1.0));
        assert!(Temperature::new(20.5, 36.0, 28.1).is_available());
    }
}
