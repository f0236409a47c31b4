use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};

use super::identity::UserIdentity;

/// The external "verify current identity" collaborator. Given a bearer
/// credential, either hands back the identity behind it or a classified
/// failure; implementations never panic across this seam.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> AuthResult<UserIdentity>;
}

/// HTTP implementation over the dashboard's identity endpoint.
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    verify_url: String,
}

impl HttpIdentityVerifier {
    /// No timeout is mandated upstream; ten seconds keeps a dead identity
    /// endpoint from wedging the boot sequence.
    const VERIFY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::VERIFY_TIMEOUT)
            .build()
            .map_err(|e| AuthError::internal("http_client_build".to_string(), e.to_string()))?;
        Ok(Self { client, verify_url: config.verify_url.clone() })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> AuthResult<UserIdentity> {
        tracing::debug!(url = %self.verify_url, "verifying bearer credential");
        let resp = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::network("verify_timeout", "identity endpoint timed out")
                } else {
                    AuthError::network("verify_unreachable".to_string(), e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "identity verification rejected");
            return Err(AuthError::from_verify_status(status.as_u16()));
        }

        resp.json::<UserIdentity>()
            .await
            .map_err(|e| AuthError::malformed("verify_bad_payload".to_string(), e.to_string()))
    }
}
