//! Router fixtures for API tests.
//!
//! Each test drives a fresh router backed by its own in-memory SQLite
//! database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use efinance_api::{AppState, create_router};
use efinance_db::migration::{Migrator, MigratorTrait};
use efinance_shared::{EmailConfig, EmailService, JwtConfig, JwtService};
use fake::Fake;
use fake::faker::name::en::FirstName;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// A running router plus direct database access.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// A registered user with a live token pair.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub const PASSWORD: &str = "correct-horse-battery";

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let state = AppState {
            db: Arc::new(db.clone()),
            jwt_service: Arc::new(JwtService::new(JwtConfig {
                secret: "api-test-secret".to_string(),
                access_token_expiry_secs: 900,
                refresh_token_expiry_secs: 3600,
            })),
            email_service: Arc::new(EmailService::new(EmailConfig::default())),
        };

        Self {
            router: create_router(state),
            db,
        }
    }

    /// Sends a request and returns the status with the decoded JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{uri}"));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user with a random name.
    pub async fn register(&self) -> TestUser {
        let first: String = FirstName().fake();
        let email = format!("{}.{}@example.com", first.to_lowercase(), Uuid::new_v4().simple());
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "password_confirm": PASSWORD,
                    "first_name": first,
                    "last_name": "Tester",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email,
            access_token: body["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Logs in again, returning the new access token.
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["tokens"]["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a category and returns its id.
    pub async fn category(
        &self,
        user: &TestUser,
        kind: &str,
        group_id: Option<Uuid>,
    ) -> Uuid {
        let (status, body) = self
            .post(
                "/categories",
                &user.access_token,
                json!({ "name": format!("{kind} things"), "type": kind, "group_id": group_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    /// Creates a group and returns its id.
    pub async fn group(&self, admin: &TestUser) -> Uuid {
        let (status, body) = self
            .post("/groups", &admin.access_token, json!({ "name": "Flatmates" }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }

    /// Records a transaction dated today and returns the response.
    pub async fn transaction(
        &self,
        user: &TestUser,
        kind: &str,
        amount: &str,
        category_id: Uuid,
        group_id: Option<Uuid>,
    ) -> (StatusCode, Value) {
        self.post(
            "/transactions",
            &user.access_token,
            json!({
                "amount": amount,
                "type": kind,
                "description": format!("{kind} {amount}"),
                "category_id": category_id,
                "group_id": group_id,
            }),
        )
        .await
    }

    /// The caller's cached personal balance, read through the API.
    pub async fn balance(&self, user: &TestUser) -> Decimal {
        let (status, body) = self.get("/auth/profile", &user.access_token).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        decimal(&body["balance"])
    }
}

/// Reads the `id` field of a response body.
pub fn id_of(body: &Value) -> Uuid {
    body["id"].as_str().expect("id field").parse().unwrap()
}

/// Parses a decimal serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}
