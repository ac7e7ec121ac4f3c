//! Credential checks, token issuance and password-change permission.
//!
//! `AuthService` holds no mutable state: each call is pure logic over its
//! arguments plus reads from the user store.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::password::PasswordHasher;
use super::token::{TokenCodec, TokenError, TokenScope};
use crate::config::{AuthConfig, PasswordChangePolicy};
use crate::models::User;
use crate::store::{StoreError, UserStore};

/// Why a password change was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDenial {
    /// No reset token was supplied and no other grant applies.
    MissingResetToken,
    /// The reset token was issued for a different user.
    TokenSubjectMismatch,
    /// The token is valid but was not issued for password resets.
    TokenScopeMismatch,
    /// The token could not be decoded (expired, forged, malformed).
    TokenRejected(TokenError),
}

impl fmt::Display for PermissionDenial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PermissionDenial::MissingResetToken => {
                write!(f, "You do not have permission to change this password.")
            }
            PermissionDenial::TokenSubjectMismatch => {
                write!(f, "Reset token is not valid for this user.")
            }
            PermissionDenial::TokenScopeMismatch => {
                write!(f, "Token is not valid for this operation.")
            }
            PermissionDenial::TokenRejected(err) => write!(f, "Reset token rejected: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Unknown user, wrong password, or an unusable token. Deliberately uninformative.
    InvalidCredentials,
    /// The target of the operation does not exist.
    NotFound(String),
    PermissionDenied(PermissionDenial),
    Internal(String),
    Store(StoreError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::NotFound(what) => write!(f, "{} not found", what),
            AuthError::PermissionDenied(reason) => write!(f, "Permission denied: {}", reason),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AuthError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        AuthError::Store(error)
    }
}

/// Response body of `POST /token` and `POST /refresh-token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    config: AuthConfig,
    // Verified against when the username is unknown, so both failures cost one bcrypt check.
    decoy_digest: Arc<str>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        codec: TokenCodec,
        hasher: PasswordHasher,
        config: AuthConfig,
    ) -> Self {
        let decoy_digest = hasher.hash("decoy password").unwrap_or_default().into();
        Self {
            users,
            codec,
            hasher,
            config,
            decoy_digest,
        }
    }

    /// Wires the codec and hasher from `config`.
    pub fn from_config(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        let codec = TokenCodec::new(&config.jwt_secret, config.jwt_algorithm);
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Self::new(users, codec, hasher, config)
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Checks a username/password pair.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self.users.get_by_username(username).await?;
        let digest = user
            .as_ref()
            .map_or(&*self.decoy_digest, |user| user.password_hash.as_str());
        let verified = self.hasher.verify(password, digest);

        match user {
            Some(user) if verified => Ok(user),
            _ => {
                warn!("Failed login attempt for username {:?}", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Issues an access token and a refresh token for `user`.
    pub fn issue_login_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = self.issue(&user.username, TokenScope::Access)?;
        let refresh_token = self.issue(&user.username, TokenScope::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self.authenticate(username, password).await?;
        self.issue_login_tokens(&user)
    }

    /// Resolves a bearer token into the user it was issued to.
    ///
    /// Only access-scoped tokens are accepted here.
    pub async fn validate_access(&self, token: &str) -> Result<User, AuthError> {
        self.resolve_scoped(token, TokenScope::Access).await
    }

    /// Resolves a refresh token into its user. The token stays valid until it expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<User, AuthError> {
        self.resolve_scoped(refresh_token, TokenScope::Refresh).await
    }

    /// Refreshes and mints a fresh access/refresh pair.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user = self.refresh(refresh_token).await?;
        self.issue_login_tokens(&user)
    }

    /// Decides whether the caller may set a new password for `target_username`.
    ///
    /// The target is looked up first, so an unknown user is reported as
    /// `NotFound` regardless of the credentials presented. A supplied reset
    /// token is always decisive: if it is wrong the change is refused even
    /// when `actor` would otherwise qualify.
    pub async fn resolve_password_change_permission(
        &self,
        target_username: &str,
        reset_token: Option<&str>,
        actor: Option<&User>,
    ) -> Result<User, AuthError> {
        let target = self
            .users
            .get_by_username(target_username)
            .await?
            .ok_or_else(|| AuthError::NotFound("User".into()))?;

        if let Some(token) = reset_token {
            let claims = self
                .codec
                .decode(token)
                .map_err(|e| AuthError::PermissionDenied(PermissionDenial::TokenRejected(e)))?;
            if claims.scope != TokenScope::PasswordReset {
                return Err(AuthError::PermissionDenied(
                    PermissionDenial::TokenScopeMismatch,
                ));
            }
            if claims.sub != target.username {
                return Err(AuthError::PermissionDenied(
                    PermissionDenial::TokenSubjectMismatch,
                ));
            }
            return Ok(target);
        }

        match (self.config.password_change_policy, actor) {
            (PasswordChangePolicy::ResetTokenOrSelf, Some(actor)) if actor.id == target.id => {
                Ok(target)
            }
            _ => Err(AuthError::PermissionDenied(
                PermissionDenial::MissingResetToken,
            )),
        }
    }

    /// Issues a `pwd_reset` token for `username` with the reset ttl.
    pub fn issue_reset_token(&self, username: &str) -> Result<String, AuthError> {
        self.issue(username, TokenScope::PasswordReset)
    }

    fn issue(&self, username: &str, scope: TokenScope) -> Result<String, AuthError> {
        let ttl = match scope {
            TokenScope::Access => self.config.access_token_ttl,
            TokenScope::Refresh => self.config.refresh_token_ttl,
            TokenScope::PasswordReset => self.config.reset_token_ttl,
        };
        self.codec
            .issue(username, scope, ttl)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn resolve_scoped(&self, token: &str, scope: TokenScope) -> Result<User, AuthError> {
        let claims = self.codec.decode(token).map_err(|e| {
            debug!("Rejected {:?} token: {}", scope, e);
            AuthError::InvalidCredentials
        })?;
        if claims.scope != scope || claims.sub.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        self.users
            .get_by_username(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }
}
