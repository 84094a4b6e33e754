use serde::{Deserialize, Serialize};

/// Identity of the caller behind a verified token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Stable user identifier assigned by the identity provider
    pub uid: String,
    /// Email address of the user
    pub email: String,
}

impl CallerIdentity {
    /// Creates an identity from its parts.
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }

    /// Whether `email` belongs to this caller, ignoring case.
    pub fn owns_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID
    pub sub: String,
    /// Email address of the user
    pub email: String,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Issued at timestamp of the token
    pub iat: usize,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        CallerIdentity::new(claims.sub, claims.email)
    }
}

/// Custom error type for token verification errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("Authorization token is required")]
    MissingToken,

    /// The token was structurally valid but unusable
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token failed decoding or validation
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The identity provider's signing keys could not be fetched
    #[error("Key fetch error: {0}")]
    KeyFetch(#[from] reqwest::Error),

    /// The token was signed with a key the identity provider does not publish
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),
}

impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            AuthError::MissingToken => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "missing_token",
                "message": "Authorization token is required"
            })),
            _ => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "invalid_token",
                "message": "Invalid or expired token"
            })),
        }
    }
}
