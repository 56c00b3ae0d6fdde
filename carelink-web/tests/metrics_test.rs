//! Metrics endpoints: grouped rates, zero-count groups, scoping, and
//! the min_count floor.

mod helpers;

use axum::http::StatusCode;
use carelink_applications::RoleTag;
use helpers::{spawn_app, TestApp};
use serde_json::json;

/// Nurse 1 works 10 care log entries (7 completed); nurse 2 works 5
/// (none completed).
async fn seed_care_logs(app: &TestApp) -> (i64, i64, String) {
    let nurse1 = app.seed_nurse("n1@example.com", "pw").await;
    let nurse2 = app.seed_nurse("n2@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;

    let shift1 = app
        .seed_shift(holder.reservation_id, Some(nurse1.id), "2024-06")
        .await;
    let shift2 = app
        .seed_shift(holder.reservation_id, Some(nurse2.id), "2024-06")
        .await;

    for i in 0..10 {
        let status = if i < 7 { "completed" } else { "pending" };
        app.seed_care_log(shift1.id, status).await;
    }
    for _ in 0..5 {
        app.seed_care_log(shift2.id, "pending").await;
    }

    let staff = app.seed_staff("admin@example.com").await;
    let session = app.staff_session(staff.id).await;
    (nurse1.id, nurse2.id, format!("session={}", session))
}

#[tokio::test]
async fn grouped_completion_rates_include_zero_count_groups() {
    let app = spawn_app().await;
    let (nurse1, nurse2, cookie) = seed_care_logs(&app).await;

    let (status, body) = app
        .get(
            "/api/metrics/care-logs?status=completed&group_by_nurse=true",
            &[("cookie", &cookie)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(7));
    assert_eq!(body["params"]["status"], json!("completed"));
    assert!(body["params_base"].get("status").is_none());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0]["nurse"], json!(nurse1));
    assert_eq!(results[0]["count"], json!(7));
    assert_eq!(results[0]["base_count"], json!(10));
    assert!((results[0]["rate"].as_f64().unwrap() - 0.7).abs() < 1e-9);

    // Nurse 2 vanished from the filtered set but still reports.
    assert_eq!(results[1]["nurse"], json!(nurse2));
    assert_eq!(results[1]["count"], json!(0));
    assert_eq!(results[1]["base_count"], json!(5));
    assert!((results[1]["rate"].as_f64().unwrap()).abs() < 1e-9);
}

#[tokio::test]
async fn min_count_prunes_rows_after_rates_are_computed() {
    let app = spawn_app().await;
    let (nurse1, _, cookie) = seed_care_logs(&app).await;

    let (status, body) = app
        .get(
            "/api/metrics/care-logs?status=completed&group_by_nurse=true&min_count=1",
            &[("cookie", &cookie)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["nurse"], json!(nurse1));
    // The rate still reflects the full base set.
    assert_eq!(results[0]["base_count"], json!(10));
}

#[tokio::test]
async fn metrics_rows_are_scoped_to_the_caller() {
    let app = spawn_app().await;
    let (nurse1, _, _) = seed_care_logs(&app).await;

    let token = app.token(RoleTag::Nurse, nurse1).await;
    let (status, body) = app
        .get(
            "/api/metrics/care-logs?group_by_nurse=true",
            &[("authorization", &token)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    // Only the caller's own group: the other nurse's entries are
    // outside the base set entirely.
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["nurse"], json!(nurse1));
    assert_eq!(results[0]["base_count"], json!(10));
}

#[tokio::test]
async fn shift_metrics_rate_checkins() {
    let app = spawn_app().await;
    let nurse = app.seed_nurse("n1@example.com", "pw").await;
    let holder = app.seed_account("holder@example.com", "pw").await;

    let checked = app
        .seed_shift(holder.reservation_id, Some(nurse.id), "2024-06")
        .await;
    app.seed_shift(holder.reservation_id, Some(nurse.id), "2024-06")
        .await;

    let token = app.token(RoleTag::Nurse, nurse.id).await;
    let (status, _) = app
        .patch(
            &format!("/api/shifts/{}", checked.id),
            &[("authorization", &token)],
            json!({"checkin": "2024-06-03T08:00:00Z"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(
            "/api/metrics/shifts?has_checkin=true&group_by_month=true",
            &[("authorization", &token)],
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["month"], json!("2024-06"));
    assert_eq!(results[0]["count"], json!(1));
    assert_eq!(results[0]["base_count"], json!(2));
    assert!((results[0]["rate"].as_f64().unwrap() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn ungrouped_requests_return_counts_only() {
    let app = spawn_app().await;
    let (_, _, cookie) = seed_care_logs(&app).await;

    let (status, body) = app
        .get("/api/metrics/care-logs?status=completed", &[("cookie", &cookie)])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(7));
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn organization_roles_have_no_care_metrics() {
    let app = spawn_app().await;
    let user = app
        .state
        .store
        .create_organization_user(carelink_applications::store::NewOrganizationUser {
            email: "org@example.com".to_string(),
            password_hash: String::new(),
            organization_id: 1,
        })
        .await
        .unwrap();

    let token = app.token(RoleTag::Organization, user.id).await;
    let (status, _) = app
        .get("/api/metrics/care-logs", &[("authorization", &token)])
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
