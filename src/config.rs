//! Construction-time configuration for the session core.
//! Everything the pipeline needs is injected here; there is no process-global
//! state and no environment probing inside the core.

/// Storage key for the persisted bearer token.
pub const TOKEN_STORAGE_KEY: &str = "boostpay.session_token";
/// Storage key for the persisted current-establishment id.
pub const ESTABLISHMENT_STORAGE_KEY: &str = "boostpay.current_establishment";
/// Reserved placeholder sometimes left behind by older dashboard builds;
/// a stored token equal to this is treated as absent.
pub const TOKEN_PLACEHOLDER: &str = "null";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity-verification endpoint ("who am I" for the active bearer).
    pub verify_url: String,
    /// Routes reachable while unauthenticated (login, public checkout links).
    pub public_paths: Vec<String>,
    pub login_path: String,
    pub home_path: String,
    /// Development-only bootstrap credential; leave `None` in production
    /// builds. Participates as the lowest tier of token precedence.
    pub fallback_token: Option<String>,
}

impl AuthConfig {
    pub fn new<S: Into<String>>(verify_url: S) -> Self {
        Self {
            verify_url: verify_url.into(),
            public_paths: vec!["/login".into(), "/checkout".into(), "/cobranca/compartilhar".into()],
            login_path: "/login".into(),
            home_path: "/".into(),
            fallback_token: None,
        }
    }

    pub fn with_fallback_token<S: Into<String>>(mut self, token: S) -> Self {
        self.fallback_token = Some(token.into());
        self
    }

    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    /// A path is public when it matches an allowlist entry exactly or lives
    /// under it (prefix followed by '/'), so shared-charge links with ids
    /// stay reachable.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| {
            path == p.as_str() || (path.starts_with(p.as_str()) && path[p.len()..].starts_with('/'))
        })
    }
}
