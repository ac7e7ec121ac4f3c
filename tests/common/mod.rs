#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    test, App, Error,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::io;
use std::sync::{Arc, Mutex};
use tarefas::{
    auth::AuthMiddleware,
    config::{AdminSeed, AuthConfig},
    notify::{Notification, NotificationSink},
    routes,
    store::MemoryStore,
    AppState,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Keeps every notification in memory.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> io::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn test_config() -> AuthConfig {
    let mut config = AuthConfig::with_secret("integration-test-secret");
    config.bcrypt_cost = 4;
    config.reset_url = "http://frontend.test/reset".to_string();
    config
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub sink: Arc<RecordingSink>,
}

impl TestContext {
    pub async fn new(config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let state = AppState::new(store.clone(), sink.clone(), config);
        state
            .users
            .ensure_admin(&AdminSeed {
                username: ADMIN_USERNAME.to_string(),
                email: "admin@example.com".to_string(),
                name: "Administrador".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        Self { store, state, sink }
    }

    pub async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        let state = self.state.clone();
        test::init_service(
            App::new()
                .configure(|cfg| state.register(cfg))
                .wrap(AuthMiddleware)
                .configure(routes::config),
        )
        .await
    }
}

pub async fn register<S, B>(app: &S, username: &str, email: &str, password: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/usuarios")
        .set_json(json!({
            "username": username,
            "email": email,
            "nome": username,
            "senha": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registration of {} failed", username);
    let body: Value = test::read_body_json(resp).await;
    body["usuario_id"].as_i64().unwrap()
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/token")
        .set_form([("username", username), ("password", password)])
        .to_request();
    test::call_service(app, req).await
}

/// Logs in and returns the access token.
pub async fn access_token<S, B>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = login(app, username, password).await;
    assert_eq!(resp.status(), 200, "login of {} failed", username);
    let body: Value = test::read_body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

/// Waits for the background reset dispatch to deliver `count` notifications.
pub async fn wait_for_notifications(sink: &RecordingSink, count: usize) -> Vec<Notification> {
    for _ in 0..100 {
        let sent = sink.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    sink.sent()
}

/// Pulls the token out of a reset link in a notification body.
pub fn reset_token_from(notification: &Notification) -> String {
    let start = notification.body.find("?token=").unwrap() + "?token=".len();
    notification.body[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
