//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (store ping)
//!
//! # Auth
//! POST   /api/auth/login/local      - Email/password login
//! POST   /api/auth/signup/local     - Create account and log in
//! GET    /api/auth/whoami           - Current user (empty if none)
//! GET    /api/auth/login/{strategy} - OAuth redirect and callback
//! POST   /api/auth/logout           - Log out, redirect to whoami
//!
//! # Cart (session-scoped pending order)
//! GET    /api/cart                  - Current cart with items
//! POST   /api/cart                  - Add an item
//! DELETE /api/cart/{product_id}     - Remove a product's items
//! ```

pub mod auth;
pub mod cart;
pub mod health;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, cart_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/local", post(auth::login_local))
        .route("/signup/local", post(auth::signup_local))
        .route("/whoami", get(auth::whoami))
        .route("/login/{strategy}", get(auth::login_oauth))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
///
/// Every matched route first runs the cart middleware.
pub fn cart_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{product_id}", delete(cart::remove))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            cart_middleware,
        ))
}

fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create all routes without rate limiting.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        .nest("/api/auth", auth_routes())
        .nest("/api/cart", cart_routes(state))
}

/// Create all routes with per-router rate limits (strict on auth, relaxed on
/// cart). Health checks are not limited.
pub fn rate_limited_routes(state: &AppState) -> Router<AppState> {
    let trust_proxy = state.config().trust_proxy_headers;
    Router::new()
        .merge(health_routes())
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter(trust_proxy)))
        .nest(
            "/api/cart",
            cart_routes(state).layer(api_rate_limiter(trust_proxy)),
        )
}
