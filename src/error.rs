//! Unified error model for the session core.
//! Every failure in this crate is either normalized into session state or
//! carried as one of these variants; nothing here is ever surfaced to the UI
//! layer as a panic.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// The identity collaborator rejected the bearer credential (401/403).
    Rejected { code: String, message: String },
    /// The collaborator could not be reached or timed out.
    Network { code: String, message: String },
    /// The collaborator answered but the payload was not identity-shaped.
    Malformed { code: String, message: String },
    /// Non-auth upstream failure (5xx and other unexpected statuses).
    Upstream { code: String, message: String },
    /// Key-value persistence failed underneath the session core.
    Storage { code: String, message: String },
    Internal { code: String, message: String },
}

impl AuthError {
    pub fn code_str(&self) -> &str {
        match self {
            AuthError::Rejected { code, .. }
            | AuthError::Network { code, .. }
            | AuthError::Malformed { code, .. }
            | AuthError::Upstream { code, .. }
            | AuthError::Storage { code, .. }
            | AuthError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Rejected { message, .. }
            | AuthError::Network { message, .. }
            | AuthError::Malformed { message, .. }
            | AuthError::Upstream { message, .. }
            | AuthError::Storage { message, .. }
            | AuthError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn rejected<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Rejected { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Network { code: code.into(), message: msg.into() } }
    pub fn malformed<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Malformed { code: code.into(), message: msg.into() } }
    pub fn upstream<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Upstream { code: code.into(), message: msg.into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Storage { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AuthError::Internal { code: code.into(), message: msg.into() } }

    /// Classify an identity-collaborator HTTP status into a failure variant.
    /// 2xx never reaches this function.
    pub fn from_verify_status(status: u16) -> Self {
        match status {
            401 | 403 => AuthError::rejected("credential_rejected", "session expired or rejected"),
            _ => AuthError::upstream(
                "verify_upstream_error".to_string(),
                format!("identity endpoint returned {}", status),
            ),
        }
    }

    /// Human-readable reason stored in `AuthState.error` when a verification
    /// fails. Session state carries strings, not enums, so UI adapters stay
    /// decoupled from this crate's error type.
    pub fn reason(&self) -> String {
        format!("{}: {}", self.code_str(), self.message())
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AuthError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(AuthError::from_verify_status(401), AuthError::Rejected { .. }));
        assert!(matches!(AuthError::from_verify_status(403), AuthError::Rejected { .. }));
        assert!(matches!(AuthError::from_verify_status(404), AuthError::Upstream { .. }));
        assert!(matches!(AuthError::from_verify_status(500), AuthError::Upstream { .. }));
        assert!(matches!(AuthError::from_verify_status(502), AuthError::Upstream { .. }));
    }

    #[test]
    fn reason_carries_code_and_message() {
        let e = AuthError::network("verify_unreachable", "connection refused");
        assert_eq!(e.reason(), "verify_unreachable: connection refused");
        assert_eq!(e.code_str(), "verify_unreachable");
        assert_eq!(e.message(), "connection refused");
    }

    #[test]
    fn anyhow_maps_to_internal() {
        let e: AuthError = anyhow::anyhow!("boom").into();
        assert!(matches!(e, AuthError::Internal { .. }));
        assert_eq!(e.message(), "boom");
    }
}
