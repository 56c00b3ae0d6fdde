//! Object-permission behavior through the REST surface.

mod helpers;

use axum::http::StatusCode;
use carelink_applications::RoleTag;
use helpers::spawn_app;
use serde_json::json;

#[tokio::test]
async fn nurse_cannot_mutate_another_nurses_shift() {
    let app = spawn_app().await;
    let owner = app.seed_nurse("owner@example.com", "pw").await;
    let other = app.seed_nurse("other@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;
    let shift = app
        .seed_shift(holder.reservation_id, Some(owner.id), "2024-06")
        .await;

    let other_token = app.token(RoleTag::Nurse, other.id).await;
    let (status, body) = app
        .patch(
            &format!("/api/shifts/{}", shift.id),
            &[("authorization", &other_token)],
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("permission_denied"));

    let owner_token = app.token(RoleTag::Nurse, owner.id).await;
    let (status, body) = app
        .patch(
            &format!("/api/shifts/{}", shift.id),
            &[("authorization", &owner_token)],
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("completed"));
}

#[tokio::test]
async fn staff_override_beats_any_ownership_mismatch() {
    let app = spawn_app().await;
    let owner = app.seed_nurse("owner@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;
    let shift = app
        .seed_shift(holder.reservation_id, Some(owner.id), "2024-06")
        .await;

    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;
    let cookie = format!("session={}", session);

    let (status, _) = app
        .patch(
            &format!("/api/shifts/{}", shift.id),
            &[("cookie", &cookie)],
            json!({"status": "reviewed"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/nurses/{}", owner.id), &[("cookie", &cookie)])
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_unassigned_shifts_are_claimable() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;
    let rival = app.seed_nurse("rival@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;
    let shift = app.seed_shift(holder.reservation_id, None, "2024-06").await;

    let token = app.token(RoleTag::Nurse, nurse.id).await;
    let (status, body) = app
        .post(
            &format!("/api/shifts/{}/claim", shift.id),
            &[("authorization", &token)],
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nurse_id"], json!(nurse.id));

    // Once assigned, the no-owner predicate denies the next claimant.
    let rival_token = app.token(RoleTag::Nurse, rival.id).await;
    let (status, body) = app
        .post(
            &format!("/api/shifts/{}/claim", shift.id),
            &[("authorization", &rival_token)],
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("permission_denied"));
}

#[tokio::test]
async fn shift_listing_is_scoped_per_role() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;
    let holder_a = app.seed_account("a@example.com", "pw").await;
    let holder_b = app.seed_account("b@example.com", "pw").await;

    app.seed_shift(holder_a.reservation_id, Some(nurse.id), "2024-06")
        .await;
    app.seed_shift(holder_b.reservation_id, None, "2024-06").await;

    let nurse_token = app.token(RoleTag::Nurse, nurse.id).await;
    let (_, body) = app
        .get("/api/shifts", &[("authorization", &nurse_token)])
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let client_token = app.token(RoleTag::Client, holder_b.id).await;
    let (_, body) = app
        .get("/api/shifts", &[("authorization", &client_token)])
        .await;
    let shifts = body.as_array().unwrap();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0]["reservation_id"], json!(holder_b.reservation_id));

    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;
    let (_, body) = app
        .get("/api/shifts", &[("cookie", &format!("session={}", session))])
        .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn account_holder_rules_for_client_records() {
    let app = spawn_app().await;
    let holder = app.seed_account("holder@example.com", "pw").await;
    let sibling = app
        .seed_sibling_client("sibling@example.com", holder.reservation_id)
        .await;
    let third = app
        .seed_sibling_client("third@example.com", holder.reservation_id)
        .await;
    let outsider = app.seed_account("outsider@example.com", "pw").await;

    let holder_token = app.token(RoleTag::Client, holder.id).await;
    let sibling_token = app.token(RoleTag::Client, sibling.id).await;

    // The holder reaches any client in its reservation.
    let (status, _) = app
        .get(
            &format!("/api/clients/{}", sibling.id),
            &[("authorization", &holder_token)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // A non-holder reaches itself...
    let (status, _) = app
        .get(
            &format!("/api/clients/{}", sibling.id),
            &[("authorization", &sibling_token)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // ...but not a peer, holder status being the difference.
    let (status, body) = app
        .get(
            &format!("/api/clients/{}", third.id),
            &[("authorization", &sibling_token)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["type"], json!("permission_denied"));

    // Nobody reaches across reservations, holder or not.
    let (status, _) = app
        .get(
            &format!("/api/clients/{}", outsider.id),
            &[("authorization", &holder_token)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn incident_visibility_is_per_object() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;
    let other = app.seed_nurse("other@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;
    let shift = app
        .seed_shift(holder.reservation_id, Some(nurse.id), "2024-06")
        .await;

    let readable = app.seed_incident(shift.id, 2).await;
    let hidden = app.seed_incident(shift.id, 3).await;

    let token = app.token(RoleTag::Nurse, nurse.id).await;

    let (status, _) = app
        .get(
            &format!("/api/incidents/{}", readable),
            &[("authorization", &token)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Same endpoint, same nurse, category outside the allow-list.
    let (status, _) = app
        .get(
            &format!("/api/incidents/{}", hidden),
            &[("authorization", &token)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A nurse from another shift is denied even for readable categories.
    let other_token = app.token(RoleTag::Nurse, other.id).await;
    let (status, _) = app
        .get(
            &format!("/api/incidents/{}", readable),
            &[("authorization", &other_token)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff see everything.
    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;
    let (status, _) = app
        .get(
            &format!("/api/incidents/{}", hidden),
            &[("cookie", &format!("session={}", session))],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_resources_are_404_not_500() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("nina@example.com", "pw").await;
    let token = app.token(RoleTag::Nurse, nurse.id).await;

    let (status, body) = app
        .get("/api/shifts/9999", &[("authorization", &token)])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], json!("not_found"));
}
