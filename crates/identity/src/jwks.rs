use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::types::{AuthError, CallerIdentity, Claims};
use crate::verifier::IdentityVerifier;

/// Public keys Firebase Authentication signs ID tokens with.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Where to fetch signing keys and what the tokens must be issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct JwksConfig {
    /// URL of the JWKS document
    pub jwks_url: String,
    /// Required `iss` claim
    pub issuer: String,
    /// Required `aud` claim
    pub audience: String,
    /// How long fetched keys are trusted before being fetched again (default: 1 hour)
    pub refresh_interval: Duration,
}

impl JwksConfig {
    /// Settings for ID tokens of the given Firebase project.
    pub fn firebase(project_id: &str) -> Self {
        Self {
            jwks_url: FIREBASE_JWKS_URL.to_string(),
            issuer: format!("https://securetoken.google.com/{project_id}"),
            audience: project_id.to_string(),
            refresh_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Shortest wait between fetches triggered by tokens naming a key the provider does not publish.
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies RS256 tokens issued by an external identity provider.
///
/// The provider's keys are fetched on first use and fetched again when the copy is older
/// than [`JwksConfig::refresh_interval`]. A token naming an unknown key triggers a fetch at
/// most once per minute; within that window it is rejected from the cache.
pub struct JwksVerifier {
    client: Client,
    config: JwksConfig,
    min_refetch_interval: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksVerifier {
    /// Creates a verifier; no keys are fetched until the first token arrives.
    pub fn new(config: JwksConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            config,
            min_refetch_interval: MIN_REFETCH_INTERVAL,
            cache: RwLock::new(None),
        })
    }

    /// Answers from the cached keys, or `None` when they must be fetched.
    fn cached_key(
        &self,
        cache: &Option<CachedKeys>,
        kid: &str,
    ) -> Option<Result<DecodingKey, AuthError>> {
        let cached = cache.as_ref()?;
        let age = cached.fetched_at.elapsed();
        if age >= self.config.refresh_interval {
            return None;
        }

        match cached.keys.find(kid) {
            Some(jwk) => Some(DecodingKey::from_jwk(jwk).map_err(AuthError::from)),
            None if age < self.min_refetch_interval => {
                Some(Err(AuthError::UnknownKey(kid.to_string())))
            }
            None => None,
        }
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = self.cached_key(&cache, kid) {
                return key;
            }
        }

        // Concurrent misses queue here and reuse the keys fetched by the first one.
        let mut cache = self.cache.write().await;
        if let Some(key) = self.cached_key(&cache, kid) {
            return key;
        }

        let keys = self.fetch_keys().await?;
        let key = keys
            .find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(AuthError::from)
            .and_then(|key| key.ok_or_else(|| AuthError::UnknownKey(kid.to_string())));

        *cache = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        debug!("Fetching signing keys from {}", self.config.jwks_url);

        let keys = self
            .client
            .get(&self.config.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                warn!("Failed to fetch signing keys: {}", e);
                e
            })?
            .json::<JwkSet>()
            .await?;

        debug!("Fetched {} signing keys", keys.keys.len());
        Ok(keys)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation
    }
}

#[async_trait]
impl IdentityVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let token_data = decode::<Claims>(token, &key, &self.validation())?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }

        Ok(token_data.claims.into())
    }
}
