use std::time::Duration;

use documents::database::DEFAULT_DATABASE_URL;
use identity::JwksConfig;
use identity::jwt::DEFAULT_DEV_SECRET;

/// Errors raised while reading the server configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },

    /// A variable required by another one is missing
    #[error("{name} must be set when {because} is set")]
    Missing {
        /// Missing variable
        name: &'static str,
        /// Variable that requires it
        because: &'static str,
    },
}

/// Where documents are stored
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// PostgreSQL reachable at the given URL
    Postgres {
        /// Connection string
        database_url: String,
    },
    /// Process memory; nothing survives a restart
    Memory,
}

/// How bearer tokens are verified
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityConfig {
    /// Tokens issued by an external identity provider publishing a JWKS document
    Jwks(JwksConfig),
    /// HS256 tokens signed with a shared secret
    SharedSecret {
        /// Signing secret
        secret: String,
        /// Whether the development fallback secret is in use
        is_default: bool,
    },
}

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to listen on (`BIND_ADDRESS`, default `0.0.0.0`)
    pub bind_address: String,
    /// Port to listen on (`PORT`, default `3000`)
    pub port: u16,
    /// Document store (`DOCUMENT_STORE`, `DATABASE_URL`)
    pub store: StoreBackend,
    /// Token verification (`IDENTITY_*`, `JWT_SECRET`)
    pub identity: IdentityConfig,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_address = get("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string());

        let port: u16 = match get("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 3000,
        };

        let store = match get("DOCUMENT_STORE").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres {
                database_url: get("DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "DOCUMENT_STORE",
                    value: other.to_string(),
                });
            }
        };

        let identity = identity_config(&get)?;

        Ok(Self {
            bind_address,
            port,
            store,
            identity,
        })
    }
}

fn identity_config(get: &impl Fn(&str) -> Option<String>) -> Result<IdentityConfig, ConfigError> {
    let jwks_url = get("IDENTITY_JWKS_URL");

    let mut jwks = match (get("IDENTITY_PROJECT_ID"), &jwks_url) {
        (Some(project_id), _) => JwksConfig::firebase(&project_id),
        (None, Some(url)) => JwksConfig {
            jwks_url: url.clone(),
            issuer: get("IDENTITY_ISSUER").ok_or(ConfigError::Missing {
                name: "IDENTITY_ISSUER",
                because: "IDENTITY_JWKS_URL",
            })?,
            audience: get("IDENTITY_AUDIENCE").ok_or(ConfigError::Missing {
                name: "IDENTITY_AUDIENCE",
                because: "IDENTITY_JWKS_URL",
            })?,
            refresh_interval: Duration::from_secs(60 * 60),
        },
        (None, None) => {
            return Ok(match get("JWT_SECRET") {
                Some(secret) => IdentityConfig::SharedSecret {
                    secret,
                    is_default: false,
                },
                None => IdentityConfig::SharedSecret {
                    secret: DEFAULT_DEV_SECRET.to_string(),
                    is_default: true,
                },
            });
        }
    };

    if let Some(url) = jwks_url {
        jwks.jwks_url = url;
    }
    if let Some(issuer) = get("IDENTITY_ISSUER") {
        jwks.issuer = issuer;
    }
    if let Some(audience) = get("IDENTITY_AUDIENCE") {
        jwks.audience = audience;
    }
    if let Some(value) = get("IDENTITY_KEY_REFRESH_SECS") {
        let secs = value.parse().map_err(|_| ConfigError::Invalid {
            name: "IDENTITY_KEY_REFRESH_SECS",
            value,
        })?;
        jwks.refresh_interval = Duration::from_secs(secs);
    }

    Ok(IdentityConfig::Jwks(jwks))
}
