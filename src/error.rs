//! Error types for the capability bridge.
//!
//! Query failures resolve the pending call with a [`BridgeError`]. Command
//! failures never reach the caller; the bridge logs them and moves on.

use crate::bridge::types::{AuthorizationDomain, CalendarAuthorizationStatus};

/// Stable, machine-readable code attached to every bridge failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HostUnavailable,
    Unauthorized,
    InvalidArgument,
    OperationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostUnavailable => "host_unavailable",
            Self::Unauthorized => "unauthorized",
            Self::InvalidArgument => "invalid_argument",
            Self::OperationFailed => "operation_failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single capability call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The privileged host layer cannot be reached.
    #[error("host unavailable: {0}")]
    HostUnavailable(String),

    /// A permission-gated query was refused; carries the status the host reported.
    #[error("{domain} access not authorized (status: {status})")]
    Unauthorized {
        domain: AuthorizationDomain,
        status: CalendarAuthorizationStatus,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

impl BridgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::HostUnavailable(_) => ErrorCode::HostUnavailable,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::OperationFailed(_) => ErrorCode::OperationFailed,
        }
    }

    /// True when the failure reflects a permission state rather than a fault.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BridgeError::HostUnavailable("gone".into()).code(),
            ErrorCode::HostUnavailable
        );
        assert_eq!(
            BridgeError::InvalidArgument("x".into()).code(),
            ErrorCode::InvalidArgument
        );
        let denied = BridgeError::Unauthorized {
            domain: AuthorizationDomain::Calendar,
            status: CalendarAuthorizationStatus::Denied,
        };
        assert_eq!(denied.code(), ErrorCode::Unauthorized);
        assert!(denied.is_authorization());
    }

    #[test]
    fn test_unauthorized_display() {
        let err = BridgeError::Unauthorized {
            domain: AuthorizationDomain::Calendar,
            status: CalendarAuthorizationStatus::Restricted,
        };
        assert_eq!(
            err.to_string(),
            "calendar access not authorized (status: restricted)"
        );
    }
}
