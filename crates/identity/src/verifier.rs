use async_trait::async_trait;

use crate::types::{AuthError, CallerIdentity};

/// Turns a bearer token into the identity of the caller presenting it.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies `token`, returning the caller it was issued to.
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError>;
}
