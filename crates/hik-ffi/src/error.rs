//! Error types for SDK session operations.

use hik_types::SessionState;
use thiserror::Error;

/// Hard failures while setting up a session.
///
/// Operations on a ready session report soft failures through
/// [`hik_types::CallOutcome`] instead.
#[derive(Debug, Error)]
pub enum HikError {
    /// Failed to load the shared library.
    #[error("Failed to load library '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// Required symbol not found in library.
    #[error("Symbol '{symbol}' not found in library")]
    SymbolNotFound { symbol: String },

    /// Changing or restoring the process working directory failed.
    #[error("Failed to change working directory to '{path}': {source}")]
    WorkingDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// NET_DVR_Init reported failure.
    #[error("SDK initialization failed")]
    InitFailed,

    /// NET_DVR_Login_V30 returned -1.
    #[error("Login to {ip}:{port} failed with SDK error code {code}")]
    LoginFailed { ip: String, port: u16, code: u32 },

    /// A string argument cannot be passed to C.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Invalid session state for operation.
    #[error("Invalid session state: expected {expected:?}, got {actual:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
}

impl HikError {
    /// Create a load error.
    pub fn load_error(path: impl Into<String>, source: libloading::Error) -> Self {
        Self::LoadError {
            path: path.into(),
            source,
        }
    }

    /// Create a symbol not found error.
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol: symbol.into(),
        }
    }

    /// Create a working directory error.
    pub fn working_directory(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::WorkingDirectory {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(expected: SessionState, actual: SessionState) -> Self {
        Self::InvalidState { expected, actual }
    }

    /// Whether the failure was reported by the SDK itself.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::InitFailed | Self::LoginFailed { .. })
    }

    /// SDK last-error code carried by this error, if any.
    pub fn native_code(&self) -> Option<u32> {
        match self {
            Self::LoginFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for session operations.
pub type HikResult<T> = Result<T, HikError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_failed_carries_code() {
        let err = HikError::LoginFailed {
            ip: "10.0.0.5".to_string(),
            port: 8000,
            code: 1,
        };
        assert!(err.is_native());
        assert_eq!(err.native_code(), Some(1));
        assert_eq!(
            err.to_string(),
            "Login to 10.0.0.5:8000 failed with SDK error code 1"
        );
    }

    #[test]
    fn test_non_native_errors() {
        let err = HikError::invalid_state(SessionState::Uninitialized, SessionState::Closed);
        assert!(!err.is_native());
        assert_eq!(err.native_code(), None);
        assert!(HikError::InitFailed.native_code().is_none());
    }
}
