//! Route table

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, state::AppState};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // login / logout
        .route("/api/nurses/login", post(handlers::auth::nurse_login))
        .route("/api/nurses/logout", post(handlers::auth::nurse_logout))
        .route("/api/clients/login", post(handlers::auth::client_login))
        .route("/api/clients/logout", post(handlers::auth::client_logout))
        .route(
            "/api/organizations/login",
            post(handlers::auth::organization_login),
        )
        .route(
            "/api/organizations/logout",
            post(handlers::auth::organization_logout),
        )
        .route("/api/donors/login", post(handlers::auth::donor_login))
        .route("/api/donors/logout", post(handlers::auth::donor_logout))
        // nurses
        .route("/api/nurses", post(handlers::nurses::create_nurse))
        .route(
            "/api/nurses/password-email",
            post(handlers::nurses::send_password_email),
        )
        .route(
            "/api/nurses/{id}",
            get(handlers::nurses::get_nurse).patch(handlers::nurses::update_nurse),
        )
        // clients and accounts
        .route("/api/accounts", post(handlers::clients::create_account))
        .route("/api/clients/{id}", get(handlers::clients::get_client))
        .route(
            "/api/addresses/unauthenticated",
            post(handlers::clients::create_address_unauthenticated),
        )
        // shifts
        .route("/api/shifts", get(handlers::shifts::list_shifts))
        .route(
            "/api/shifts/{id}",
            get(handlers::shifts::get_shift).patch(handlers::shifts::update_shift),
        )
        .route("/api/shifts/{id}/claim", post(handlers::shifts::claim_shift))
        // incidents
        .route("/api/incidents/{id}", get(handlers::incidents::get_incident))
        // metrics
        .route(
            "/api/metrics/care-logs",
            get(handlers::metrics::care_log_metrics),
        )
        .route("/api/metrics/shifts", get(handlers::metrics::shift_metrics))
        // internal
        .route(
            "/api/internal/organization-users",
            get(handlers::internal::list_organization_users),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
