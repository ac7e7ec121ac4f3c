pub mod extractors;
pub mod middleware;
pub mod password;
pub mod reset;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::{AuthenticatedUser, MaybeAuthenticatedUser};
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use reset::{PasswordResetService, ResetOutcome};
pub use service::{AuthError, AuthService, PermissionDenial, TokenPair};
pub use token::{Claims, TokenCodec, TokenError, TokenScope};

/// Form body of `POST /token` (OAuth2 password-grant style field names).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// JSON body of `POST /refresh-token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// JSON body of `POST /usuarios/reset-senha`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email)]
    pub email: String,
}

/// Query string of `PATCH /usuarios/{username}/senha`.
#[derive(Debug, Deserialize)]
pub struct PasswordResetQuery {
    pub pwd_reset_token: Option<String>,
}
