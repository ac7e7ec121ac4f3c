mod common;

use actix_web::test;
use common::{access_token, bearer, login, register, test_config, TestContext};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use tarefas::auth::TokenScope;

#[test_log::test(actix_rt::test)]
async fn test_login_and_access_flow() {
    let mut config = test_config();
    config.access_token_ttl = chrono::Duration::seconds(2);
    let ctx = TestContext::new(config).await;
    let app = ctx.app().await;

    register(&app, "bob", "bob@example.com", "secret123").await;

    let resp = login(&app, "bob", "secret123").await;
    assert_eq!(resp.status(), 200);
    let tokens: Value = test::read_body_json(resp).await;
    assert_eq!(tokens["token_type"], "bearer");
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();
    assert_ne!(access, refresh);

    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["username"], "bob");
    assert!(me.get("password_hash").is_none());

    tokio::time::sleep(Duration::from_secs(3)).await;

    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(access))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new(test_config()).await;
    let app = ctx.app().await;
    register(&app, "bob", "bob@example.com", "secret123").await;

    let wrong_password = login(&app, "bob", "not-it").await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_password: Value = test::read_body_json(wrong_password).await;

    let unknown_user = login(&app, "nobody", "secret123").await;
    assert_eq!(unknown_user.status(), 401);
    let unknown_user: Value = test::read_body_json(unknown_user).await;

    assert_eq!(wrong_password, unknown_user);
}

#[actix_rt::test]
async fn test_protected_routes_require_bearer() {
    let ctx = TestContext::new(test_config()).await;
    let app = ctx.app().await;

    let req = test::TestRequest::get().uri("/tarefas").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers().get("WWW-Authenticate").unwrap(), "Bearer");

    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_refresh_issues_new_pair() {
    let ctx = TestContext::new(test_config()).await;
    let app = ctx.app().await;
    register(&app, "bob", "bob@example.com", "secret123").await;

    let resp = login(&app, "bob", "secret123").await;
    let tokens: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::post()
        .uri("/refresh-token")
        .set_json(json!({ "refresh_token": tokens["refresh_token"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let fresh: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(fresh["access_token"].as_str().unwrap()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_tokens_are_bound_to_their_scope() {
    let ctx = TestContext::new(test_config()).await;
    let app = ctx.app().await;
    register(&app, "bob", "bob@example.com", "secret123").await;

    let resp = login(&app, "bob", "secret123").await;
    let tokens: Value = test::read_body_json(resp).await;

    // An access token cannot be refreshed.
    let req = test::TestRequest::post()
        .uri("/refresh-token")
        .set_json(json!({ "refresh_token": tokens["access_token"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // A refresh token does not grant access.
    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(tokens["refresh_token"].as_str().unwrap()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // Nor does a reset token.
    let reset = ctx.state.auth.issue_reset_token("bob").unwrap();
    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(&reset))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let claims = ctx.state.auth.codec().decode(&reset).unwrap();
    assert_eq!(claims.scope, TokenScope::PasswordReset);
}

#[actix_rt::test]
async fn test_token_for_deleted_user_is_rejected() {
    let ctx = TestContext::new(test_config()).await;
    let app = ctx.app().await;
    let bob_id = register(&app, "bob", "bob@example.com", "secret123").await;
    let bob_token = access_token(&app, "bob", "secret123").await;
    let admin_token = access_token(&app, common::ADMIN_USERNAME, common::ADMIN_PASSWORD).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/usuarios/{}", bob_id))
        .insert_header(bearer(&admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/usuarios/me")
        .insert_header(bearer(&bob_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
