//! Metrics endpoints
//!
//! Each endpoint declares its optional filter parameters and grouping
//! dimensions, scopes the rows to what the caller may see, and hands
//! the rest to the aggregation engine.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use carelink_applications::domain::{CareLogView, Shift};
use carelink_applications::metrics::{compute, GroupDim, MetricsResponse, MetricsSpec, OptionalFilter};
use serde_json::Value;

use crate::{
    error::WebResult,
    extract::Authenticated,
    handlers::shift_scope_for,
    state::AppState,
};

/// Truthiness for boolean-valued filter parameters.
fn bool_param(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes")
}

fn care_log_spec() -> MetricsSpec<CareLogView> {
    MetricsSpec {
        filters: vec![
            OptionalFilter {
                param: "status",
                matches: |row, value| row.entry.status == value,
            },
            OptionalFilter {
                param: "has_observations",
                matches: |row, value| row.entry.has_observations == bool_param(value),
            },
            OptionalFilter {
                param: "created_by_nurse",
                matches: |row, value| row.entry.created_by_nurse == bool_param(value),
            },
        ],
        dimensions: vec![
            GroupDim {
                param: "group_by_month",
                field: "month",
                extract: |row| Value::from(row.shift_month.clone()),
            },
            GroupDim {
                param: "group_by_nurse",
                field: "nurse",
                extract: |row| row.shift_nurse_id.map(Value::from).unwrap_or(Value::Null),
            },
            GroupDim {
                param: "group_by_status",
                field: "status",
                extract: |row| Value::from(row.entry.status.clone()),
            },
        ],
    }
}

fn shift_spec() -> MetricsSpec<Shift> {
    MetricsSpec {
        filters: vec![
            OptionalFilter {
                param: "has_checkin",
                matches: |shift, value| shift.checkin.is_some() == bool_param(value),
            },
            OptionalFilter {
                param: "has_checkout",
                matches: |shift, value| shift.checkout.is_some() == bool_param(value),
            },
        ],
        dimensions: vec![
            GroupDim {
                param: "group_by_month",
                field: "month",
                extract: |shift| Value::from(shift.month.clone()),
            },
            GroupDim {
                param: "group_by_nurse",
                field: "nurse",
                extract: |shift| shift.nurse_id.map(Value::from).unwrap_or(Value::Null),
            },
        ],
    }
}

/// GET /api/metrics/care-logs: completion rates for care log entries.
pub async fn care_log_metrics(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
    Query(params): Query<BTreeMap<String, String>>,
) -> WebResult<Json<MetricsResponse>> {
    let scope = shift_scope_for(&context)?;
    let rows = state.store.list_care_logs(scope).await?;

    Ok(Json(compute(&rows, &params, &care_log_spec())))
}

/// GET /api/metrics/shifts: check-in/out rates for shifts.
pub async fn shift_metrics(
    State(state): State<AppState>,
    Authenticated(context): Authenticated,
    Query(params): Query<BTreeMap<String, String>>,
) -> WebResult<Json<MetricsResponse>> {
    let scope = shift_scope_for(&context)?;
    let rows = state.store.list_shifts(scope).await?;

    Ok(Json(compute(&rows, &params, &shift_spec())))
}
