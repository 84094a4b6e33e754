use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::types::{AuthError, CallerIdentity, Claims};
use crate::verifier::IdentityVerifier;

/// Development secret used when `JWT_SECRET` is not set.
pub const DEFAULT_DEV_SECRET: &str = "your-secret-key-change-this-in-production";

/// Issues and verifies HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a service signing with `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Issues a token for `identity` valid for `ttl`.
    pub fn generate_token(
        &self,
        identity: &CallerIdentity,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InvalidToken("expiry out of range".to_string()))?
            .timestamp()
            .max(0) as usize;

        let claims = Claims {
            sub: identity.uid.clone(),
            email: identity.email.clone(),
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Decodes `token`, checking its signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtService {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        Ok(self.verify_token(token)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let service = JwtService::new("test-secret");
        let caller = CallerIdentity::new("uid-a", "a@x.com");

        let token = service.generate_token(&caller, Duration::hours(1)).unwrap();
        let verified = service.verify(&token).await.unwrap();

        assert_eq!(verified, caller);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let service = JwtService::new("test-secret");
        let caller = CallerIdentity::new("uid-a", "a@x.com");

        let token = service.generate_token(&caller, Duration::hours(-2)).unwrap();

        assert!(matches!(service.verify(&token).await, Err(AuthError::Jwt(_))));
    }

    #[tokio::test]
    async fn test_foreign_signature_is_rejected() {
        let issuer = JwtService::new("someone-else");
        let service = JwtService::new("test-secret");
        let caller = CallerIdentity::new("uid-a", "a@x.com");

        let token = issuer.generate_token(&caller, Duration::hours(1)).unwrap();

        assert!(service.verify(&token).await.is_err());
        assert!(service.verify("not-a-jwt").await.is_err());
    }
}
