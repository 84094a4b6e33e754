//! # Identity
//!
//! This crate verifies the bearer tokens presented to private endpoints.
//! It includes the `IdentityVerifier` seam, a shared-secret JWT verifier, a verifier for
//! tokens issued by an external identity provider publishing a JWKS document, and the
//! actix-web middleware that attaches the caller's identity to each request.

/// Verification of tokens signed by an external identity provider.
pub mod jwks;
/// Shared-secret JWT issuing and verification.
pub mod jwt;
/// Middleware for request authentication and caller identity extraction.
pub mod middleware;
/// Types and structures used by the identity verifiers.
pub mod types;
/// The `IdentityVerifier` trait.
pub mod verifier;

pub use jwks::{JwksConfig, JwksVerifier};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use types::{AuthError, CallerIdentity, Claims};
pub use verifier::IdentityVerifier;
