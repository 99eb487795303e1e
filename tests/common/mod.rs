#![allow(dead_code)]

use actix_web::dev::{Service, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{body::MessageBody, http::header, test, web, App};
use chrono::Duration;
use serde_json::{json, Value};
use taskdesk::app::AppState;
use taskdesk::auth::{AuthResponse, TokenService};
use taskdesk::models::{Task, TaskEnvelope};
use taskdesk::routes;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration_test_secret";

pub fn tokens() -> TokenService {
    TokenService::new(TEST_SECRET, Duration::hours(1))
}

/// Fresh in-memory state; every test gets its own stores.
pub fn state() -> AppState {
    AppState::in_memory(tokens())
}

pub async fn init_app(
    state: &AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let state = state.clone();
    test::init_service(
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
            .default_service(web::to(routes::not_found)),
    )
    .await
}

// Helper struct to hold auth details
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub async fn register_user(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    name: &str,
    email: &str,
    password: &str,
) -> TestUser {
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    assert_eq!(
        status,
        actix_web::http::StatusCode::CREATED,
        "registration of {} failed: {}",
        email,
        String::from_utf8_lossy(&body)
    );

    let auth: AuthResponse = serde_json::from_slice(&body).expect("registration response");
    TestUser {
        id: auth.user.id,
        token: auth.token,
    }
}

/// Creates a task through the API and returns it, asserting a 201.
pub async fn create_task(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    user: &TestUser,
    payload: Value,
) -> Task {
    let req = test::TestRequest::post()
        .uri("/tasks")
        .append_header(user.auth_header())
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    let envelope: TaskEnvelope = test::read_body_json(resp).await;
    envelope.task
}

pub async fn list_tasks(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    user: &TestUser,
) -> Vec<Task> {
    let req = test::TestRequest::get()
        .uri("/tasks")
        .append_header(user.auth_header())
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    serde_json::from_value(body["tasks"].clone()).expect("task list")
}

pub fn task_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} (details)", title),
        "dueDate": "2025-01-10"
    })
}

/// Field names listed in a validation error body.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
