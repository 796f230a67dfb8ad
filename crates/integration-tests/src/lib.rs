//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server against a scratch database
//! cargo run -p cartwheel-cli -- migrate
//! cargo run -p cartwheel-server
//!
//! # Run the ignored HTTP tests against it
//! cargo test -p cartwheel-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Signup, login, whoami, logout
//! - `cart_flow` - Session carts, items, cart hand-over on login

use reqwest::Client;

/// Base URL of the server under test (`CARTWHEEL_TEST_URL`).
#[must_use]
pub fn base_url() -> String {
    std::env::var("CARTWHEEL_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps the session cookie, like a browser.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@Example.com", uuid::Uuid::new_v4().simple())
}
