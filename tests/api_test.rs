//! Integration tests for API endpoints.
//!
//! The router runs on the in-memory backend with demo data, so no database
//! or Redis is needed.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use supper_club::api::{create_router, AppState};
use supper_club::config::Config;
use supper_club::infra::{ErrorLog, DEMO_ADMIN_EMAIL, DEMO_GUEST_EMAIL, DEMO_MEMBER_EMAIL, DEMO_PASSWORD};

// =============================================================================
// Helpers
// =============================================================================

fn app() -> Router {
    let state = AppState::in_memory(Config::development(), ErrorLog::default()).unwrap();
    create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"].as_str().unwrap().to_string()
}

async fn event_id(app: &Router, token: &str, title: &str) -> String {
    let (_, events) = send(app, Method::GET, "/events", Some(token), None).await;
    events
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["title"] == title)
        .and_then(|e| e["id"].as_str())
        .unwrap()
        .to_string()
}

// =============================================================================
// Health & Authentication
// =============================================================================

#[tokio::test]
async fn test_health_reports_backend_and_sessions() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["backend"]["status"], "healthy");
    assert_eq!(body["services"]["sessions"]["status"], "healthy");
}

#[tokio::test]
async fn test_protected_routes_need_a_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let app = app();
    let (status, user) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "Ada@Example.com", "password": "roast-chicken", "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["is_admin"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "ada@example.com", "password": "roast-chicken", "name": "Ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_IN_USE");

    let token = login(&app, "ada@example.com", "roast-chicken").await;
    let (status, me) = send(&app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ada");
}

#[tokio::test]
async fn test_invalid_sign_up_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "short", "name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": DEMO_MEMBER_EMAIL, "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = app();
    let token = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "SESSION_EXPIRED");
}

#[tokio::test]
async fn test_password_reset_answers_the_same_for_unknown_email() {
    let app = app();
    for email in [DEMO_MEMBER_EMAIL, "nobody@example.com"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/password-reset",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["message"].is_string());
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/password-reset/confirm",
        None,
        Some(json!({ "token": "bogus", "new_password": "new-password-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_RESET_TOKEN");
}

// =============================================================================
// Catalog, membership & registration
// =============================================================================

#[tokio::test]
async fn test_catalog_prices_for_the_caller() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let guest = login(&app, DEMO_GUEST_EMAIL, DEMO_PASSWORD).await;

    for (token, expected) in [(&member, 120.0), (&guest, 150.0)] {
        let (status, events) = send(&app, Method::GET, "/events", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);

        let tuscan = events
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["title"] == "Tuscan Harvest Supper")
            .unwrap();
        assert_eq!(tuscan["price"], 150.0);
        assert_eq!(tuscan["member_price"], expected);
    }
}

#[tokio::test]
async fn test_non_member_registration_points_to_offer() {
    let app = app();
    let guest = login(&app, DEMO_GUEST_EMAIL, DEMO_PASSWORD).await;
    let id = event_id(&app, &guest, "Street Food Sunday").await;

    let uri = format!("/events/{}/registration", id);
    let (status, body) = send(&app, Method::POST, &uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "SUBSCRIPTION_REQUIRED");
    assert_eq!(body["error"]["offer"], "/me/subscription");

    let (_, mine) = send(&app, Method::GET, "/me/registrations", Some(&guest), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_subscribe_then_register() {
    let app = app();
    let guest = login(&app, DEMO_GUEST_EMAIL, DEMO_PASSWORD).await;

    let (_, status_view) = send(&app, Method::GET, "/me/subscription", Some(&guest), None).await;
    assert_eq!(status_view["active"], false);
    assert_eq!(status_view["offer"]["price"], 197.0);

    let (status, subscription) = send(
        &app,
        Method::POST,
        "/me/subscription",
        Some(&guest),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subscription["status"], "active");
    assert_eq!(subscription["payment_method"], "card");

    let (status, _) = send(
        &app,
        Method::POST,
        "/me/subscription",
        Some(&guest),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let id = event_id(&app, &guest, "Street Food Sunday").await;
    let uri = format!("/events/{}/registration", id);
    let (status, registration) = send(&app, Method::POST, &uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registration["status"], "confirmed");

    let (status, body) = send(&app, Method::POST, &uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_REGISTERED");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Second withdrawal is a no-op
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&guest), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_full_event_waitlists_member() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let id = event_id(&app, &member, "Omakase Night").await;

    let uri = format!("/events/{}/registration", id);
    let (status, registration) = send(&app, Method::POST, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registration["status"], "waitlist");

    let (_, event) = send(&app, Method::GET, &format!("/events/{}", id), Some(&member), None).await;
    assert_eq!(event["registered_count"], 20);
    assert_eq!(event["waitlist_count"], 1);
}

#[tokio::test]
async fn test_past_event_is_closed() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let id = event_id(&app, &member, "Winter Truffle Dinner").await;

    let uri = format!("/events/{}/registration", id);
    let (status, body) = send(&app, Method::POST, &uri, Some(&member), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "REGISTRATION_CLOSED");
}

// =============================================================================
// Uploads
// =============================================================================

async fn upload(app: &Router, token: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Response {
    let boundary = "supper-club-boundary";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: {c}\r\n\r\n",
        b = boundary,
        f = file_name,
        c = content_type
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_upload_refuses_markup_disguised_as_image() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;

    let response = upload(
        &app,
        &member,
        "avatar.html",
        "image/png",
        b"<script>alert(document.cookie)</script>",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&app, &member, "logo.svg", "image/svg+xml", b"<svg onload=alert(1)/>").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_uploaded_image_is_served_as_image() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    let response = upload(&app, &member, "avatar.html", "image/png", png).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.ends_with(".png"), "stored as {}", url);

    let path = &url[url.find("/uploads/").unwrap()..];
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let served = app.clone().oneshot(request).await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.headers()[header::CONTENT_TYPE], "image/png");
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_event_writes_are_admin_only() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let admin = login(&app, DEMO_ADMIN_EMAIL, DEMO_PASSWORD).await;

    let new_event = json!({
        "title": "Paella on the Terrace",
        "description": "Saffron, seafood and sea air.",
        "chef_name": "Rosa Vidal",
        "date": "2099-06-01T19:00:00Z",
        "location": "Rooftop",
        "capacity": 16,
        "price": 95.0
    });

    let (status, _) = send(&app, Method::POST, "/events", Some(&member), Some(new_event.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, event) = send(&app, Method::POST, "/events", Some(&admin), Some(new_event)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["registered_count"], 0);

    let uri = format!("/events/{}", event["id"].as_str().unwrap());
    let (status, updated) = send(&app, Method::PUT, &uri, Some(&admin), Some(json!({ "capacity": 24 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["capacity"], 24);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn test_review_moderation_flow() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let admin = login(&app, DEMO_ADMIN_EMAIL, DEMO_PASSWORD).await;
    let id = event_id(&app, &member, "Winter Truffle Dinner").await;
    let reviews_uri = format!("/events/{}/reviews", id);

    let (status, body) = send(
        &app,
        Method::POST,
        &reviews_uri,
        Some(&member),
        Some(json!({ "rating": 6, "comment": "Off the charts" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_RATING");

    let (status, review) = send(
        &app,
        Method::POST,
        &reviews_uri,
        Some(&member),
        Some(json!({ "rating": 3, "comment": "Good, not great" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["status"], "pending");
    assert_eq!(review["user_name"], "Marco Member");

    let (status, _) = send(&app, Method::GET, "/admin/reviews", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, pending) = send(&app, Method::GET, "/admin/reviews", Some(&admin), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let approve_uri = format!("/admin/reviews/{}/approve", review["id"].as_str().unwrap());
    let (status, approved) = send(&app, Method::POST, &approve_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (_, visible) = send(&app, Method::GET, &reviews_uri, Some(&member), None).await;
    assert_eq!(visible.as_array().unwrap().len(), 2);

    let (_, event) = send(&app, Method::GET, &format!("/events/{}", id), Some(&member), None).await;
    assert_eq!(event["rating"]["count"], 2);
    assert_eq!(event["rating"]["average"], 4.0);

    let delete_uri = format!("/admin/reviews/{}", review["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &delete_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &delete_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_error_log_is_admin_only() {
    let app = app();
    let member = login(&app, DEMO_MEMBER_EMAIL, DEMO_PASSWORD).await;
    let admin = login(&app, DEMO_ADMIN_EMAIL, DEMO_PASSWORD).await;

    let (status, _) = send(&app, Method::GET, "/admin/errors", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, entries) = send(&app, Method::GET, "/admin/errors", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(entries.as_array().unwrap().is_empty());
}
