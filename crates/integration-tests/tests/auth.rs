//! Registration, token login/logout and the current user.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use little_lemon_integration_tests::{PASSWORD, TestContext};

#[tokio::test]
async fn test_register_creates_customer() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post(
            "/api/users",
            None,
            json!({ "username": "Hamm", "password": "piggy-bank-1", "email": "hamm@littlelemon.test" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["username"], "Hamm");
    assert_eq!(resp.body["email"], "hamm@littlelemon.test");
    assert!(resp.body.get("password").is_none());
    assert!(resp.body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let ctx = TestContext::new().await;

    let duplicate = ctx
        .post("/api/users", None, json!({ "username": "Woody", "password": PASSWORD }))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let weak = ctx
        .post("/api/users", None, json!({ "username": "Hamm", "password": "short" }))
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let bad_name = ctx
        .post("/api/users", None, json!({ "username": "Mr Potato Head", "password": PASSWORD }))
        .await;
    assert_eq!(bad_name.status, StatusCode::BAD_REQUEST);

    let bad_email = ctx
        .post(
            "/api/users",
            None,
            json!({ "username": "Hamm", "password": PASSWORD, "email": "not-an-address" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let missing = ctx
        .post("/api/users", None, json!({ "username": "Hamm" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_me_logout() {
    let ctx = TestContext::new().await;

    let login = ctx
        .post("/token/login", None, json!({ "username": "Buzz", "password": PASSWORD }))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["auth_token"].as_str().unwrap().to_owned();
    assert_eq!(token.len(), 40);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

    let me = ctx
        .send_with_token(Method::GET, "/api/users/me", Some(&token), None)
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "Buzz");
    assert_eq!(me.body["groups"], json!([]));

    let logout = ctx
        .send_with_token(Method::POST, "/token/logout", Some(&token), None)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let after = ctx
        .send_with_token(Method::GET, "/api/users/me", Some(&token), None)
        .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    // Logging out one session leaves the others alone
    let fixture = ctx.get("/api/users/me", Some("Buzz")).await;
    assert_eq!(fixture.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .post("/token/login", None, json!({ "username": "Buzz", "password": "to-infinity" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.message(), "Unable to log in with provided credentials");

    let unknown = ctx
        .post("/token/login", None, json!({ "username": "Zurg", "password": PASSWORD }))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.message(), resp.message());
}

#[tokio::test]
async fn test_logout_needs_token() {
    let ctx = TestContext::new().await;

    let resp = ctx.send(Method::POST, "/token/logout", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_shows_groups() {
    let ctx = TestContext::new().await;

    let anonymous = ctx.get("/api/users/me", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let manager = ctx.get("/api/users/me", Some("Woody")).await;
    assert_eq!(manager.status, StatusCode::OK);
    assert_eq!(manager.body["groups"], json!(["Manager"]));

    let crew = ctx.get("/api/users/me", Some("Slinky")).await;
    assert_eq!(crew.body["groups"], json!(["Delivery Crew"]));
}

#[tokio::test]
async fn test_invalid_token_is_rejected_everywhere() {
    let ctx = TestContext::new().await;

    // Public endpoints still refuse a bad token rather than treating the
    // caller as anonymous
    let resp = ctx
        .send_with_token(Method::GET, "/api/menu-items", Some("not-a-real-token"), None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.message(), "Invalid token");
}
