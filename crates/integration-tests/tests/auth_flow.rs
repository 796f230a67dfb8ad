//! Integration tests for the auth endpoints.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (cw-cli migrate)
//! - The server running (cargo run -p cartwheel-server)
//!
//! Run with: cargo test -p cartwheel-integration-tests -- --ignored

use cartwheel_integration_tests::{base_url, session_client, unique_email};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_signup_whoami_logout() {
    let client = session_client();
    let base = base_url();
    let email = unique_email("signup");

    let resp = client
        .post(format!("{base}/api/auth/signup/local"))
        .json(&json!({"email": email, "password": "correct horse"}))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let me: Value = client
        .get(format!("{base}/api/auth/whoami"))
        .send()
        .await
        .expect("Failed to get whoami")
        .json()
        .await
        .expect("whoami should be JSON after signup");
    assert_eq!(me["email"], email.to_lowercase());
    assert_eq!(me["account_type"], "user");
    assert!(me.get("password_digest").is_none());

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert!(resp.status().is_redirection());

    let body = client
        .get(format!("{base}/api/auth/whoami"))
        .send()
        .await
        .expect("Failed to get whoami")
        .text()
        .await
        .expect("Failed to read body");
    assert!(body.is_empty());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_duplicate_signup_conflicts() {
    let base = base_url();
    let email = unique_email("dup");
    let body = json!({"email": email, "password": "pw"});

    let first = session_client()
        .post(format!("{base}/api/auth/signup/local"))
        .json(&body)
        .send()
        .await
        .expect("Failed to sign up");
    assert!(first.status().is_success());

    let second = session_client()
        .post(format!("{base}/api/auth/signup/local"))
        .json(&json!({"email": email.to_uppercase(), "password": "pw"}))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_login_with_wrong_password() {
    let base = base_url();
    let email = unique_email("login");

    session_client()
        .post(format!("{base}/api/auth/signup/local"))
        .json(&json!({"email": email, "password": "right"}))
        .send()
        .await
        .expect("Failed to sign up");

    let resp = session_client()
        .post(format!("{base}/api/auth/login/local"))
        .json(&json!({"email": email, "password": "wrong"}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = resp.json().await.expect("Error body should be JSON");
    assert_eq!(body, json!({"error": "Login incorrect"}));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_strategy() {
    let resp = session_client()
        .get(format!("{}/api/auth/login/myspace", base_url()))
        .send()
        .await
        .expect("Failed to request strategy");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
