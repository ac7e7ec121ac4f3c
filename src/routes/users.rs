use crate::{
    auth::{
        AuthService, AuthenticatedUser, MaybeAuthenticatedUser, PasswordResetQuery,
        PasswordResetService, ResetRequest,
    },
    error::AppError,
    models::{PasswordChangeInput, UserInput, UserResponse, UserUpdate},
    services::UserService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user. Public.
///
/// ## Responses:
/// - `201 Created`: `{detail, usuario_id}`.
/// - `409 Conflict`: Username or e-mail already taken.
/// - `422 Unprocessable Entity`: Input validation failed.
#[post("")]
pub async fn register(
    users: web::Data<UserService>,
    body: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    let user = users.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "detail": "User created successfully.",
        "usuario_id": user.id
    })))
}

/// The authenticated user's own profile.
#[get("/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(UserResponse::from(user.0))
}

/// All users. Admin only.
#[get("")]
pub async fn list_users(
    users: web::Data<UserService>,
    actor: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let list: Vec<UserResponse> = users
        .list_users(&actor.0)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(list))
}

/// Request a password-reset e-mail. Public.
///
/// Always answers with the same message whether or not the address is
/// registered; the lookup and delivery happen after the response.
#[post("/reset-senha")]
pub async fn request_password_reset(
    reset: web::Data<PasswordResetService>,
    body: web::Json<ResetRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    reset.dispatch(body.into_inner().email);
    Ok(HttpResponse::Ok().json(json!({
        "detail": "If the e-mail is registered, a password reset link has been sent."
    })))
}

/// A single user. Admin only.
#[get("/{id}")]
pub async fn get_user(
    users: web::Data<UserService>,
    path: web::Path<i32>,
    actor: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = users.get_user(path.into_inner(), &actor.0).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Update a profile. The user themselves or an admin.
#[patch("/{id}")]
pub async fn update_user(
    users: web::Data<UserService>,
    path: web::Path<i32>,
    body: web::Json<UserUpdate>,
    actor: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = users
        .update_profile(path.into_inner(), body.into_inner(), &actor.0)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "detail": "User updated successfully.",
        "usuario_id": user.id
    })))
}

/// Delete a user and all their tasks. Admin only.
#[delete("/{id}")]
pub async fn delete_user(
    users: web::Data<UserService>,
    path: web::Path<i32>,
    actor: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    users.delete_user(path.into_inner(), &actor.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "detail": "User deleted successfully." })))
}

/// Set a new password.
///
/// Permission comes from the `pwd_reset_token` query parameter (or, under the
/// self-service policy, from the caller's own bearer token). Only once
/// permission is granted are `senha` and `confirmar_senha` compared.
///
/// ## Responses:
/// - `200 OK`: Password changed.
/// - `400 Bad Request`: Passwords do not match.
/// - `401 Unauthorized`: Reset token expired or malformed.
/// - `403 Forbidden`: No token, token for another user, or not a reset token.
/// - `404 Not Found`: Unknown username.
#[patch("/{username}/senha")]
pub async fn change_password(
    auth: web::Data<AuthService>,
    users: web::Data<UserService>,
    path: web::Path<String>,
    query: web::Query<PasswordResetQuery>,
    actor: MaybeAuthenticatedUser,
    body: web::Json<PasswordChangeInput>,
) -> Result<impl Responder, AppError> {
    let target = auth
        .resolve_password_change_permission(
            &path,
            query.pwd_reset_token.as_deref(),
            actor.0.as_ref(),
        )
        .await?;
    let user = users.change_password(target, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "detail": "Password changed successfully.",
        "usuario_id": user.id
    })))
}
