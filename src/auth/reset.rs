//! Password-reset requests.
//!
//! The HTTP handler answers immediately and hands the e-mail address to
//! [`PasswordResetService::dispatch`], which does the lookup, token issuance
//! and notification on a detached task. Nothing from that task ever reaches
//! the original caller.

use actix_web::rt;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::service::{AuthError, AuthService};
use crate::config::AuthConfig;
use crate::models::User;
use crate::notify::{Notification, NotificationSink};
use crate::store::UserStore;

pub const RESET_SUBJECT: &str = "API - Redefinição de Senha";

/// Outcome of one reset request, used for logging and tests only.
#[derive(Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    Sent,
    UnknownEmail,
}

#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserStore>,
    auth: AuthService,
    sink: Arc<dyn NotificationSink>,
    reset_url: String,
    sender: String,
    ttl_minutes: i64,
    timeout: std::time::Duration,
}

impl PasswordResetService {
    pub fn new(
        users: Arc<dyn UserStore>,
        auth: AuthService,
        sink: Arc<dyn NotificationSink>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            auth,
            sink,
            reset_url: config.reset_url.clone(),
            sender: config.sender.clone(),
            ttl_minutes: config.reset_token_ttl.num_minutes(),
            timeout: config.reset_dispatch_timeout,
        }
    }

    /// Looks up `email` and, if it belongs to a user, sends them a reset link.
    ///
    /// An unknown address is not an error.
    pub async fn request_reset(&self, email: &str) -> Result<ResetOutcome, AuthError> {
        let user = match self.users.get_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!("Password reset requested for an unregistered address");
                return Ok(ResetOutcome::UnknownEmail);
            }
        };

        let token = self.auth.issue_reset_token(&user.username)?;
        let notification = self.compose(&user, &token);
        self.sink
            .deliver(&notification)
            .await
            .map_err(|e| AuthError::Internal(format!("notification delivery failed: {}", e)))?;

        info!("Password reset link sent to user {}", user.id);
        Ok(ResetOutcome::Sent)
    }

    /// Runs [`request_reset`](Self::request_reset) in the background, bounded
    /// by the configured timeout. Failures are logged and dropped.
    pub fn dispatch(&self, email: String) -> JoinHandle<()> {
        let service = self.clone();
        rt::spawn(async move {
            match tokio::time::timeout(service.timeout, service.request_reset(&email)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Password reset dispatch failed: {}", e),
                Err(_) => warn!(
                    "Password reset dispatch timed out after {:?}",
                    service.timeout
                ),
            }
        })
    }

    fn compose(&self, user: &User, token: &str) -> Notification {
        let body = format!(
            "From: API <{sender}>\n\
             To: {to}\n\
             Subject: Redefinição de senha\n\
             \n\
             Use o link a seguir para redefinir sua senha:\n\
             {url}?token={token}\n\
             \n\
             Este link expirará em {minutes} minutos.\n",
            sender = self.sender,
            to = user.name,
            url = self.reset_url,
            token = token,
            minutes = self.ttl_minutes,
        );
        Notification {
            to_email: user.email.clone(),
            subject: RESET_SUBJECT.to_string(),
            body,
        }
    }
}
