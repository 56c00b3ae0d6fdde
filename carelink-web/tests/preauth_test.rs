//! The signed-token signup flows: nurse profile completion and
//! account-creation follow-up writes.

mod helpers;

use std::time::Duration;

use axum::http::StatusCode;
use carelink_applications::auth::signed::{
    ACCOUNT_CREATE_UNAUTHENTICATED, UPDATE_NURSE_UNAUTHENTICATED,
};
use helpers::spawn_app;
use serde_json::json;

#[tokio::test]
async fn nurse_completes_profile_with_the_signup_token() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/nurses",
            &[],
            json!({
                "email": "nina@example.com",
                "first_name": "Nina",
                "surname": "Vega",
                "password": "hunter22",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let nurse_id = body["id"].as_i64().unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // No Authorization header at all: the body token authenticates the
    // mutation.
    let (status, body) = app
        .patch(
            &format!("/api/nurses/{}", nurse_id),
            &[],
            json!({"token": token, "phone": "555-0100", "bank_name": "Banco Uno"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], json!("555-0100"));
    assert_eq!(body["bank_name"], json!("Banco Uno"));

    // The token is replayable within its lifetime by design.
    let (status, _) = app
        .patch(
            &format!("/api/nurses/{}", nurse_id),
            &[],
            json!({"token": token, "phone": "555-0101"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_nurse_email_is_a_400_conflict() {
    let app = spawn_app().await;
    app.seed_nurse("nina@example.com", "pw").await;

    let (status, body) = app
        .post(
            "/api/nurses",
            &[],
            json!({
                "email": "nina@example.com",
                "first_name": "Nina",
                "surname": "Vega",
                "password": "hunter22",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], json!("email_exists"));
}

#[tokio::test]
async fn signup_token_is_bound_to_its_subject() {
    let app = spawn_app().await;

    let (_, created) = app
        .post(
            "/api/nurses",
            &[],
            json!({
                "email": "nina@example.com",
                "first_name": "Nina",
                "surname": "Vega",
                "password": "hunter22",
            }),
        )
        .await;
    let token = created["token"].as_str().unwrap().to_string();

    let other = app.seed_nurse("other@example.com", "pw").await;

    // Nina's token authenticates Nina, and the self-rule then denies
    // the touch on the other nurse.
    let (status, body) = app
        .patch(
            &format!("/api/nurses/{}", other.id),
            &[],
            json!({"token": token, "phone": "555-0100"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("permission_denied"));
}

#[tokio::test]
async fn wrong_namespace_is_rejected_with_its_reason() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;

    // An account-creation token used on the nurse-update flow.
    let token = app
        .state
        .signer
        .mint(nurse.id, ACCOUNT_CREATE_UNAUTHENTICATED, Duration::from_secs(3600))
        .unwrap();

    let (status, body) = app
        .patch(
            &format!("/api/nurses/{}", nurse.id),
            &[],
            json!({"token": token, "phone": "555-0100"}),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("token_namespace"));
}

#[tokio::test]
async fn expired_token_is_rejected_with_its_reason() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;

    let token = app
        .state
        .signer
        .mint(nurse.id, UPDATE_NURSE_UNAUTHENTICATED, Duration::ZERO)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (status, body) = app
        .patch(
            &format!("/api/nurses/{}", nurse.id),
            &[],
            json!({"token": token, "phone": "555-0100"}),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("token_expired"));
}

#[tokio::test]
async fn tampered_token_fails_integrity() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;

    let mut token = app
        .state
        .signer
        .mint(nurse.id, UPDATE_NURSE_UNAUTHENTICATED, Duration::from_secs(3600))
        .unwrap();
    token.pop();

    let (status, body) = app
        .patch(
            &format!("/api/nurses/{}", nurse.id),
            &[],
            json!({"token": token, "phone": "555-0100"}),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("token_invalid"));
}

#[tokio::test]
async fn account_token_attaches_addresses_to_its_own_reservation() {
    let app = spawn_app().await;

    let (status, created) = app
        .post(
            "/api/accounts",
            &[],
            json!({
                "email": "carl@example.com",
                "first_name": "Carl",
                "surname": "Ruiz",
                "password": "hunter22",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reservation_id = created["reservation_id"].as_i64().unwrap();
    let token = created["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/addresses/unauthenticated",
            &[],
            json!({
                "token": token,
                "reservation_id": reservation_id,
                "street": "Calle 5 de Mayo 12",
                "city": "Puebla",
                "postal_code": "72000",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reservation_id"], json!(reservation_id));

    // The token's subject must match the posted reservation.
    let other = app.seed_account("other@example.com", "pw").await;
    let (status, body) = app
        .post(
            "/api/addresses/unauthenticated",
            &[],
            json!({
                "token": created["token"],
                "reservation_id": other.reservation_id,
                "street": "Av. Juarez 8",
                "city": "Puebla",
                "postal_code": "72000",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], json!("incorrect_account"));
}

#[tokio::test]
async fn duplicate_account_email_is_a_400_conflict() {
    let app = spawn_app().await;
    app.seed_account("carl@example.com", "pw").await;

    let (status, body) = app
        .post(
            "/api/accounts",
            &[],
            json!({
                "email": "carl@example.com",
                "first_name": "Carl",
                "surname": "Ruiz",
                "password": "hunter22",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], json!("email_exists"));
}
