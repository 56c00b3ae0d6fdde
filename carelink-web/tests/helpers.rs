//! Shared fixtures for the integration tests: an in-process app plus
//! seeding shortcuts that talk straight to the stores.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use carelink_applications::auth::password::hash_password;
use carelink_applications::domain::{ClientUser, NurseUser, Shift, StaffUser};
use carelink_applications::store::{
    NewCareLogEntry, NewClient, NewIncident, NewNurse, NewShift, NewStaff,
};
use carelink_applications::{Notifier, RoleTag};
use carelink_web::{router, AppState, WebConfig};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const INTERNAL_SECRET: &str = "internal-test-secret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

pub async fn spawn_app() -> TestApp {
    let config = WebConfig {
        internal_secret: INTERNAL_SECRET.to_string(),
        ..WebConfig::default()
    };
    let state = AppState::new(config, Notifier::Null)
        .await
        .expect("failed to build app state");

    TestApp {
        app: router(state.clone()),
        state,
    }
}

impl TestApp {
    /// Drive one request through the router and decode the JSON body.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        self.request("GET", uri, headers, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("POST", uri, headers, Some(body)).await
    }

    pub async fn patch(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: Value,
    ) -> (StatusCode, Value) {
        self.request("PATCH", uri, headers, Some(body)).await
    }

    // --- seeding ---

    pub async fn seed_nurse(&self, email: &str, password: &str) -> NurseUser {
        self.state
            .store
            .create_nurse(NewNurse {
                email: email.to_string(),
                phone: None,
                first_name: "Test".to_string(),
                surname: "Nurse".to_string(),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap()
    }

    /// Create a reservation with its holder client.
    pub async fn seed_account(&self, email: &str, password: &str) -> ClientUser {
        let (_, client) = self
            .state
            .store
            .create_account(
                email.to_string(),
                "Test".to_string(),
                "Client".to_string(),
                hash_password(password).unwrap(),
            )
            .await
            .unwrap();
        client
    }

    /// Attach a non-holder client to an existing reservation.
    pub async fn seed_sibling_client(&self, email: &str, reservation_id: i64) -> ClientUser {
        self.state
            .store
            .create_client(NewClient {
                email: email.to_string(),
                first_name: "Sibling".to_string(),
                surname: "Client".to_string(),
                password_hash: String::new(),
                reservation_id,
                account_holder: false,
            })
            .await
            .unwrap()
    }

    pub async fn seed_staff(&self, email: &str) -> StaffUser {
        self.state
            .store
            .create_staff(NewStaff {
                email: email.to_string(),
                password_hash: String::new(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_shift(
        &self,
        reservation_id: i64,
        nurse_id: Option<i64>,
        month: &str,
    ) -> Shift {
        self.state
            .store
            .create_shift(NewShift {
                reservation_id,
                nurse_id,
                month: month.to_string(),
                status: "scheduled".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_care_log(&self, shift_id: i64, status: &str) {
        self.state
            .store
            .create_care_log_entry(NewCareLogEntry {
                shift_id,
                status: status.to_string(),
                has_observations: false,
                created_by_nurse: true,
            })
            .await
            .unwrap();
    }

    pub async fn seed_incident(&self, shift_id: i64, category: i64) -> i64 {
        self.state
            .store
            .create_incident(NewIncident {
                shift_id,
                category,
                description: "incident".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    /// Issue a bearer token straight from the token store.
    pub async fn token(&self, role: RoleTag, user_id: i64) -> String {
        self.state
            .tokens
            .get_or_create(role, user_id)
            .await
            .unwrap()
            .key
    }

    /// Staff session cookie value.
    pub async fn staff_session(&self, staff_id: i64) -> String {
        self.token(RoleTag::Staff, staff_id).await
    }
}
