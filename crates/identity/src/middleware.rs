use actix_web::{
    Error, HttpMessage, Result, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
    sync::Arc,
};

use crate::types::{AuthError, CallerIdentity};
use crate::verifier::IdentityVerifier;

/// Middleware guarding private routes: verifies the bearer token and stores the
/// caller's [`CallerIdentity`] in the request extensions.
#[derive(Clone)]
pub struct AuthMiddleware {
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthMiddleware {
    /// Creates the middleware around a token verifier.
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();

        Box::pin(async move {
            let token = match bearer_token(&req).map(str::to_string) {
                Some(token) => token,
                None => {
                    let response = AuthError::MissingToken.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let caller = match verifier.verify(&token).await {
                Ok(caller) => caller,
                Err(e) => {
                    match &e {
                        AuthError::KeyFetch(_) => log::error!("🔑 Token verification failed: {}", e),
                        _ => log::debug!("🔑 Rejected token: {}", e),
                    }
                    let response = e.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            req.extensions_mut().insert(caller);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header; the scheme is case-insensitive.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let (scheme, token) = req
        .headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .trim()
        .split_once(' ')?;

    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Custom extractor for the authenticated caller
pub struct AuthenticatedUser(pub CallerIdentity);

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let caller = req.extensions().get::<CallerIdentity>().cloned();

        ready(match caller {
            Some(caller) => Ok(AuthenticatedUser(caller)),
            None => Err(AuthError::MissingToken.into()),
        })
    }
}
