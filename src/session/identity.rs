use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstablishmentMembership {
    pub id: i64,
    #[serde(default)]
    pub role: String,
}

/// The verified identity behind the active bearer credential.
/// Replaced wholesale on every successful verification; never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    /// Opaque subject identifier, typically the login e-mail.
    pub subject: String,
    #[serde(default)]
    pub establishments: Vec<EstablishmentMembership>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Expiry claim carried over from the token, when the collaborator
    /// exposes one.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_active() -> bool { true }

impl UserIdentity {
    pub fn belongs_to(&self, establishment_id: i64) -> bool {
        self.establishments.iter().any(|m| m.id == establishment_id)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiry, Some(exp) if exp <= now)
    }
}
