//! Authentication route handlers.
//!
//! Mounted at `/api/auth`. Local login and signup hand the session's guest
//! cart over to the user; OAuth uses a single route for both the redirect to
//! the provider and the provider's callback.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use cartwheel_core::{Email, OAuthProvider, OrderId};

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::{NewUser, Order, User, keys};
use crate::services::auth::{AuthError, AuthService};
use crate::services::cart::CartService;
use crate::services::oauth::generate_state;
use crate::state::AppState;

/// Email and password from a login or signup request.
///
/// Missing fields deserialize as empty strings so validation, not the JSON
/// extractor, decides the response.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query parameters on the OAuth route.
#[derive(Debug, Deserialize)]
pub struct OAuthQuery {
    /// Authorization code (present on the provider's callback).
    pub code: Option<String>,
    /// CSRF state echoed back by the provider.
    pub state: Option<String>,
    /// Error code if the user denied access.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Store the user in the session and tag Sentry events with them.
async fn establish_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, user).await?;
    set_sentry_user(&user.id, user.email.as_ref().map(Email::as_str));
    Ok(())
}

/// Reconcile the session cart after login. Returns the user's existing
/// pending order if it replaced the guest cart.
async fn adopt_cart(state: &AppState, session: &Session, user: &User) -> Result<Option<Order>> {
    let cart_id: Option<OrderId> = session.get(keys::CART_ID).await?;
    let adopted = CartService::new(state.store())
        .adopt_on_login(user.id, cart_id)
        .await?;

    if let Some(order) = &adopted {
        session.insert(keys::CART_ID, order.id).await?;
    }
    Ok(adopted)
}

/// Log in with email and password.
///
/// Responds with the user's existing pending order (now the session cart),
/// or 204 after assigning the guest cart to the user.
///
/// # Route
///
/// `POST /api/auth/login/local`
#[instrument(skip_all)]
pub async fn login_local(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Response> {
    let user = AuthService::new(state.store())
        .login_local(&credentials.email, &credentials.password)
        .await?;

    establish_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    match adopt_cart(&state, &session, &user).await? {
        Some(order) => Ok(Json(order).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Create an account and log it in.
///
/// Responds with the guest cart, now owned by the new user, or 204 if the
/// session had no cart.
///
/// # Route
///
/// `POST /api/auth/signup/local`
#[instrument(skip_all)]
pub async fn signup_local(
    State(state): State<AppState>,
    session: Session,
    Json(credentials): Json<Credentials>,
) -> Result<Response> {
    let new_user = NewUser {
        email: Some(credentials.email),
        password: Some(SecretString::from(credentials.password)),
        ..NewUser::default()
    };
    let user = AuthService::new(state.store()).signup(new_user).await?;

    establish_session(&session, &user).await?;

    let cart_id: Option<OrderId> = session.get(keys::CART_ID).await?;
    let cart = CartService::new(state.store())
        .assign_guest_cart(user.id, cart_id)
        .await?;

    match cart {
        Some(order) => Ok(Json(order).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// The logged-in user, or an empty 200 response.
///
/// # Route
///
/// `GET /api/auth/whoami`
pub async fn whoami(OptionalUser(user): OptionalUser) -> Response {
    match user {
        Some(user) => Json(user).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// OAuth login for the named strategy.
///
/// Without a `code`, stores a CSRF state in the session and redirects to the
/// provider. With a `code` (the provider's callback), verifies the state,
/// exchanges the code, logs the user in, and redirects to `/`.
///
/// # Route
///
/// `GET /api/auth/login/{strategy}`
#[instrument(skip(state, session, query))]
pub async fn login_oauth(
    State(state): State<AppState>,
    session: Session,
    Path(strategy): Path<String>,
    Query(query): Query<OAuthQuery>,
) -> Result<Response> {
    let client = state.oauth().resolve(&strategy)?;
    let provider = client.provider();

    if let Some(error) = query.error {
        tracing::warn!(
            %provider,
            error = %error,
            description = %query.error_description.unwrap_or_default(),
            "OAuth authorization denied"
        );
        return Err(AuthError::InvalidCredentials.into());
    }

    let Some(code) = query.code else {
        let csrf_state = generate_state();
        session
            .insert(keys::OAUTH_STATE, (provider, &csrf_state))
            .await?;
        return Ok(Redirect::to(&client.authorization_url(&csrf_state)).into_response());
    };

    // One-time use
    let expected: Option<(OAuthProvider, String)> = session.remove(keys::OAUTH_STATE).await?;
    let state_matches = matches!(
        (&expected, &query.state),
        (Some((p, expected)), Some(returned)) if *p == provider && expected == returned
    );
    if !state_matches {
        tracing::warn!(%provider, "OAuth state mismatch");
        return Err(AuthError::InvalidSessionState.into());
    }

    let tokens = client.exchange_code(&code).await?;
    let profile = client.fetch_profile(&tokens).await?;
    let user = AuthService::new(state.store())
        .login_oauth(profile, tokens)
        .await?;

    establish_session(&session, &user).await?;
    adopt_cart(&state, &session, &user).await?;
    add_breadcrumb("auth", "OAuth login", &[("provider", provider.to_string())]);
    tracing::info!(user_id = %user.id, %provider, "User logged in via OAuth");

    Ok(Redirect::to("/").into_response())
}

/// Log out and redirect to `whoami`.
///
/// # Route
///
/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/api/auth/whoami"))
}
