use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::AuthService;
use crate::error::AppError;

/// Resolves `Authorization: Bearer <token>` into a [`User`](crate::models::User)
/// stored in the request extensions.
///
/// Non-public routes answer 401 without a valid access token. Public routes
/// never require one, but still get the user attached when a valid token is
/// sent (the password-change route uses it under the self-service policy).
/// Requires `web::Data<AuthService>` in the app data.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
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
        let service = Rc::clone(&self.service);
        let public = is_public(req.method(), req.path());
        let token = bearer_token(&req).map(str::to_owned);

        Box::pin(async move {
            let outcome = match token {
                Some(token) => match req.app_data::<web::Data<AuthService>>().cloned() {
                    Some(auth) => auth.validate_access(&token).await.map_err(AppError::from),
                    None => Err(AppError::InternalServerError(
                        "AuthService is not registered".into(),
                    )),
                },
                None => Err(AppError::Unauthorized("Missing token".into())),
            };

            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                }
                Err(err) if !public => {
                    return Ok(req.error_response(err).map_into_right_body());
                }
                Err(_) => {}
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Routes reachable without a bearer token.
fn is_public(method: &Method, path: &str) -> bool {
    if path == "/health" {
        return true;
    }
    if *method == Method::POST {
        return matches!(
            path,
            "/token" | "/refresh-token" | "/usuarios" | "/usuarios/reset-senha"
        );
    }
    *method == Method::PATCH && path.starts_with("/usuarios/") && path.ends_with("/senha")
}
