//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Error bodies are JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The storage error behind this error, if any.
    fn source_repository(&self) -> Option<&RepositoryError> {
        match self {
            Self::Database(e)
            | Self::Auth(AuthError::Repository(e))
            | Self::Cart(CartError::Repository(e)) => Some(e),
            _ => None,
        }
    }

    /// Whether this is a server-side failure worth reporting.
    fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_)
            | Self::Internal(_)
            | Self::Auth(AuthError::PasswordHash(_) | AuthError::OAuth(_)) => true,
            _ => matches!(self.source_repository(), Some(RepositoryError::Database(_))),
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if let Some(repo) = self.source_repository() {
            return match repo {
                RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Rejected(_) => StatusCode::BAD_REQUEST,
            };
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidSessionState => StatusCode::BAD_REQUEST,
                AuthError::UnknownStrategy(_) => StatusCode::NOT_FOUND,
                AuthError::OAuth(_) => StatusCode::BAD_GATEWAY,
                AuthError::PasswordHash(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(CartError::InvalidItem(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(repo) = self.source_repository() {
            return match repo {
                RepositoryError::Database(_) => "Internal server error".to_string(),
                RepositoryError::Conflict(msg) | RepositoryError::Rejected(msg) => msg.clone(),
            };
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Login incorrect".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidSessionState => "Session expired, please try again".to_string(),
                AuthError::UnknownStrategy(name) => format!("Unknown login strategy: {name}"),
                AuthError::OAuth(_) => "Login provider error".to_string(),
                AuthError::PasswordHash(_) | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Cart(CartError::InvalidItem(msg)) => msg.clone(),
            Self::Session(_) | Self::Internal(_) | Self::Database(_) | Self::Cart(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a cart or auth action.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwheel_core::EmailError;

    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Internal("cart middleware not installed".to_string());
        assert_eq!(err.to_string(), "Internal error: cart middleware not installed");
        assert_eq!(err.message(), "Internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = CartError::InvalidItem("quantity must be at least 1".to_string()).into();
        assert_eq!(err.message(), "quantity must be at least 1");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(AuthError::InvalidEmail(EmailError::Empty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AuthError::UnknownStrategy("myspace".to_string()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(AuthError::OAuth("boom".to_string()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_repository_status_codes_through_every_layer() {
        let conflict = || RepositoryError::Conflict("user already exists".to_string());
        let rejected = || RepositoryError::Rejected("product 9 does not exist".to_string());

        assert_eq!(status(conflict().into()), StatusCode::CONFLICT);
        assert_eq!(
            status(AuthError::Repository(conflict()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(CartError::Repository(rejected()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(RepositoryError::Database(sqlx::Error::PoolTimedOut).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_hide_internals() {
        let err: AppError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.message(), "Internal server error");

        let err: AppError = AuthError::OAuth("client_secret rejected".to_string()).into();
        assert_eq!(err.message(), "Login provider error");

        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.message(), "Login incorrect");
    }

    #[tokio::test]
    async fn test_body_is_json() {
        let response = AppError::from(AuthError::InvalidCredentials).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "Login incorrect"}));
    }
}
