//! Authentication extractors and session helpers.
//!
//! The session stores only the user's ID. [`OptionalUser`] reloads the user
//! from the store on each request; a stale ID yields no user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use cartwheel_core::UserId;

use crate::error::AppError;
use crate::models::{User, keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that optionally loads the logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalUser(user): OptionalUser) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.id),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };

        let Some(user_id) = current_user_id(session).await? else {
            return Ok(Self(None));
        };

        let user = AuthService::new(state.store())
            .deserialize_user(user_id)
            .await?;
        if user.is_none() {
            tracing::debug!(user_id = %user_id, "Session user no longer exists");
        }

        Ok(Self(user))
    }
}

/// Get the logged-in user's ID from the session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn current_user_id(
    session: &Session,
) -> Result<Option<UserId>, tower_sessions::session::Error> {
    session.get(keys::USER_ID).await
}

/// Log a user in: rotate the session ID and store the user's ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::USER_ID, user.id).await
}

/// Log the user out. The session (and its cart) survives.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(keys::USER_ID).await?;
    Ok(())
}
