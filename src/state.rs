use crate::{
    auth::{AuthService, PasswordResetService},
    config::AuthConfig,
    notify::NotificationSink,
    services::{TaskService, UserService},
    store::{TaskStore, UserStore},
};
use actix_web::web;
use std::sync::Arc;

/// The services every handler (and the auth middleware) pulls from app data.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub tasks: TaskService,
    pub reset: PasswordResetService,
}

impl AppState {
    /// Builds all services on top of one backing store.
    pub fn new<S>(store: Arc<S>, sink: Arc<dyn NotificationSink>, config: AuthConfig) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        let user_store: Arc<dyn UserStore> = store.clone();
        let task_store: Arc<dyn TaskStore> = store;

        let auth = AuthService::from_config(user_store.clone(), config.clone());
        let users = UserService::new(user_store.clone(), auth.hasher().clone());
        let tasks = TaskService::new(task_store);
        let reset = PasswordResetService::new(user_store, auth.clone(), sink, &config);

        Self {
            auth,
            users,
            tasks,
            reset,
        }
    }

    /// Registers each service as `web::Data`.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.tasks.clone()))
            .app_data(web::Data::new(self.reset.clone()));
    }
}
