//! End-to-end authentication flows: login token reuse, logout
//! revocation, the role-hint short-circuit, and the internal and
//! session backends.

mod helpers;

use axum::http::StatusCode;
use carelink_applications::store::NewOrganizationUser;
use carelink_applications::RoleTag;
use helpers::{spawn_app, INTERNAL_SECRET};
use serde_json::json;

#[tokio::test]
async fn login_returns_the_same_token_until_logout() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "hunter22").await;

    let (status, first) = app
        .post(
            "/api/nurses/login",
            &[],
            json!({"email": "nina@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], json!(nurse.id));

    let (status, second) = app
        .post(
            "/api/nurses/login",
            &[],
            json!({"email": "nina@example.com", "password": "hunter22"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["token"], second["token"]);

    let token = first["token"].as_str().unwrap();

    // The token authenticates requests.
    let (status, body) = app
        .get(
            &format!("/api/nurses/{}", nurse.id),
            &[("authorization", token)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("nina@example.com"));

    // Logout deletes the row; the old token fails closed.
    let (status, _) = app
        .post("/api/nurses/logout", &[("authorization", token)], json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(
            &format!("/api/nurses/{}", nurse.id),
            &[("authorization", token)],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], json!("not_authenticated"));
}

#[tokio::test]
async fn bad_password_is_rejected_with_the_envelope() {
    let app = spawn_app().await;
    app.seed_nurse("nina@example.com", "hunter22").await;

    let (status, body) = app
        .post(
            "/api/nurses/login",
            &[],
            json!({"email": "nina@example.com", "password": "wrong"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], json!("not_authenticated"));
    assert!(body["message_client"].is_string());
}

#[tokio::test]
async fn role_hint_limits_lookups_to_the_hinted_backend() {
    let app = spawn_app().await;
    let client = app.seed_account("carl@example.com", "hunter22").await;
    let token = app.token(RoleTag::Client, client.id).await;

    let before = app.state.tokens.lookup_count();
    let (status, _) = app
        .get(
            &format!("/api/clients/{}", client.id),
            &[("authorization", &token), ("x-role-hint", "client_token")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Exactly one storage lookup: the hinted backend's. Without the
    // hint the nurse backend would have burned one first.
    assert_eq!(app.state.tokens.lookup_count() - before, 1);
}

#[tokio::test]
async fn hinted_invalid_credential_never_falls_through() {
    let app = spawn_app().await;
    let client = app.seed_account("carl@example.com", "hunter22").await;
    let token = app.token(RoleTag::Client, client.id).await;

    let before = app.state.tokens.lookup_count();

    // A valid client token presented under a nurse hint: the nurse
    // backend must reject it outright even though the client backend
    // would have accepted the same raw value.
    let (status, body) = app
        .get(
            &format!("/api/clients/{}", client.id),
            &[("authorization", &token), ("x-role-hint", "nurse_token")],
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], json!("not_authenticated"));
    assert_eq!(app.state.tokens.lookup_count() - before, 1);
}

#[tokio::test]
async fn unknown_role_hint_is_diagnosable() {
    let app = spawn_app().await;

    let (status, body) = app
        .get("/api/shifts", &[("authorization", "x"), ("x-role-hint", "root")])
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], json!("invalid_role_hint"));
}

#[tokio::test]
async fn internal_secret_gates_internal_endpoints() {
    let app = spawn_app().await;
    app.state
        .store
        .create_organization_user(NewOrganizationUser {
            email: "org@example.com".to_string(),
            password_hash: String::new(),
            organization_id: 7,
        })
        .await
        .unwrap();

    let (status, body) = app
        .get(
            "/api/internal/organization-users",
            &[("authorization", INTERNAL_SECRET)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Staff are authenticated but still not the internal service.
    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;
    let (status, body) = app
        .get(
            "/api/internal/organization-users",
            &[("cookie", &format!("session={}", session))],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("permission_denied"));

    // A wrong secret is not silently re-tried elsewhere.
    let (status, _) = app
        .get("/api/internal/organization-users", &[("authorization", "nope")])
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_authenticates_staff() {
    let app = spawn_app().await;
    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;

    let (status, body) = app
        .get("/api/shifts", &[("cookie", &format!("session={}", session))])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn logout_requires_the_matching_role_endpoint() {
    let app = spawn_app().await;
    let client = app.seed_account("carl@example.com", "hunter22").await;
    let token = app.token(RoleTag::Client, client.id).await;

    let (status, _) = app
        .post("/api/nurses/logout", &[("authorization", &token)], json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/api/clients/logout", &[("authorization", &token)], json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
}
