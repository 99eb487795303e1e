mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use taskdesk::auth::{AuthResponse, TokenService};
use taskdesk::models::UserProfile;

use common::{error_fields, init_app, register_user, state};

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let state = state();
    let app = init_app(&state).await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "name": "  Integration User ",
            "email": "Integration@Example.com",
            "password": "Password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let registered: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(registered.message, "User registered successfully");
    assert_eq!(registered.user.name, "Integration User");
    assert_eq!(registered.user.email, "integration@example.com");

    let claims = state.tokens.verify(&registered.token).unwrap();
    assert_eq!(claims.sub, registered.user.id);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "email": "INTEGRATION@example.com",
            "password": "Password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let login: AuthResponse = test::read_body_json(resp).await;
    assert_eq!(login.message, "Login successful");
    assert_eq!(login.user, registered.user);
    assert!(!login.token.is_empty());

    // The login token is accepted by protected routes.
    let req = test::TestRequest::get()
        .uri("/tasks")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", login.token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_register_rejects_duplicate_email() {
    let app = init_app(&state()).await;
    register_user(&app, "First", "dup@example.com", "Password123").await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "name": "Second",
            "email": "DUP@example.com",
            "password": "Password456"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User already exists");
}

#[actix_rt::test]
async fn test_register_validation_errors() {
    let app = init_app(&state()).await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "name": "   ",
            "email": "not-an-email",
            "password": "short"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Validation Error");
    assert_eq!(error_fields(&body), vec!["email", "name", "password"]);

    // A request missing fields entirely never reaches validation.
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": "ada@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_login_failures_are_unauthorized() {
    let app = init_app(&state()).await;
    register_user(&app, "Ada", "ada@example.com", "Password123").await;

    let attempts = [
        json!({ "email": "ada@example.com", "password": "WrongPassword" }),
        json!({ "email": "nobody@example.com", "password": "Password123" }),
    ];

    for payload in attempts {
        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "payload {}", payload);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid credentials");
    }

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "email": "ada@example.com", "password": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["password"]);
}

#[actix_rt::test]
async fn test_profile_read_and_rename() {
    let app = init_app(&state()).await;
    let user = register_user(&app, "Ada", "ada@example.com", "Password123").await;

    let req = test::TestRequest::get()
        .uri("/auth/profile")
        .append_header(user.auth_header())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let profile: UserProfile = serde_json::from_value(body["user"].clone()).unwrap();
    assert_eq!(profile.id, user.id);
    assert_eq!(profile.name, "Ada");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password").is_none());

    let req = test::TestRequest::put()
        .uri("/auth/profile")
        .append_header(user.auth_header())
        .set_json(json!({ "name": "Ada Lovelace", "email": "ada@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert_eq!(body["user"]["email"], "ada@example.com");

    let req = test::TestRequest::put()
        .uri("/auth/profile")
        .append_header(user.auth_header())
        .set_json(json!({ "email": "someone-else@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["email"]);

    let req = test::TestRequest::put()
        .uri("/auth/profile")
        .append_header(user.auth_header())
        .set_json(json!({ "name": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(error_fields(&body), vec!["name"]);

    // Rejected updates leave the stored name alone.
    let req = test::TestRequest::get()
        .uri("/auth/profile")
        .append_header(user.auth_header())
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["user"]["name"], "Ada Lovelace");
}

#[actix_rt::test]
async fn test_profile_requires_valid_token() {
    let app = init_app(&state()).await;

    let req = test::TestRequest::get().uri("/auth/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Signed with a different secret.
    let foreign = TokenService::new("some_other_secret", chrono::Duration::hours(1))
        .issue(uuid::Uuid::new_v4())
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/auth/profile")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", foreign)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_token_for_unknown_user_gets_not_found_profile() {
    let state = state();
    let app = init_app(&state).await;
    let token = state.tokens.issue(uuid::Uuid::new_v4()).unwrap();

    let req = test::TestRequest::get()
        .uri("/auth/profile")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User not found");
}

#[actix_rt::test]
async fn test_health_is_public_and_unknown_routes_are_not_found() {
    let app = init_app(&state()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "API is running");
    assert!(body["timestamp"].is_string());

    let req = test::TestRequest::get().uri("/does/not/exist").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "message": "Route not found" }));
}
