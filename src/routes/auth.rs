use crate::{
    auth::{AuthService, LoginForm, RefreshRequest},
    error::AppError,
};
use actix_web::{post, web, HttpResponse, Responder};

/// Login
///
/// Exchanges a form-encoded `username`/`password` pair for an access token and
/// a refresh token.
///
/// ## Responses:
/// - `200 OK`: `{access_token, refresh_token, token_type: "bearer"}`.
/// - `401 Unauthorized`: Unknown username or wrong password (indistinguishable).
#[post("/token")]
pub async fn login(
    auth: web::Data<AuthService>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let tokens = auth.login(&form.username, &form.password).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// Refresh
///
/// Trades a refresh token for a fresh access/refresh pair. The presented
/// refresh token is not invalidated.
///
/// ## Responses:
/// - `200 OK`: `{access_token, refresh_token, token_type: "bearer"}`.
/// - `401 Unauthorized`: Expired, forged or non-refresh token.
#[post("/refresh-token")]
pub async fn refresh_token(
    auth: web::Data<AuthService>,
    body: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    let tokens = auth.refresh_tokens(&body.refresh_token).await?;
    Ok(HttpResponse::Ok().json(tokens))
}
