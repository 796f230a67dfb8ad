//! Authentication service.
//!
//! Provides local (email + password) and OAuth authentication on top of a
//! [`Store`].

mod error;
pub mod password;

pub use error::AuthError;

use secrecy::ExposeSecret;

use cartwheel_core::{AccountType, Email, EmailError, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::oauth::{NewOAuthAccount, OAuthProfile};
use crate::models::user::{NewUser, User, UserChanges, UserProfile, UserRecord};
use crate::services::oauth::OAuthTokens;

/// Authentication service.
///
/// Handles signup, local login, session deserialization, and OAuth login.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Local Authentication
    // =========================================================================

    /// Register a new user.
    ///
    /// Self-service signups always get `AccountType::User`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is missing or malformed.
    /// Returns `AuthError::WeakPassword` if the password is missing or empty.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn signup(&self, user: NewUser) -> Result<User, AuthError> {
        if user.email.is_none() {
            return Err(AuthError::InvalidEmail(EmailError::Empty));
        }
        validate_password(&user)?;

        let record = NewUser {
            account_type: AccountType::User,
            ..user
        }
        .prepare()
        .await?;

        let user = self.store.insert_user(record).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// The email is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is malformed or
    /// unknown, or the password doesn't match.
    pub async fn login_local(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Ok(email) = Email::parse(email) else {
            tracing::debug!("Login rejected: malformed email");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(user) = self.store.find_user_for_login(&email).await? else {
            tracing::debug!("Login rejected: no such user");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.authenticate(password).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Load the user behind a session's stored ID.
    ///
    /// Returns `None` if the user no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn deserialize_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_user(id).await?)
    }

    /// Apply a partial update, re-running the pre-persist hook.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email and
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_user(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, AuthError> {
        let record = changes.prepare().await?;
        self.store.update_user(id, record).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
    }

    // =========================================================================
    // OAuth Authentication
    // =========================================================================

    /// Find or create the user for a provider identity.
    ///
    /// A returning identity gets its tokens and profile refreshed. A new
    /// identity creates a user without a password; the provider's email is
    /// kept only if it is valid and not already registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a store operation fails.
    pub async fn login_oauth(
        &self,
        profile: OAuthProfile,
        tokens: OAuthTokens,
    ) -> Result<User, AuthError> {
        let account = NewOAuthAccount {
            provider: profile.provider,
            uid: profile.uid.clone(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            profile: profile.raw,
        };

        if let Some(user) = self
            .store
            .find_user_by_oauth(profile.provider, &profile.uid)
            .await?
        {
            self.store.refresh_oauth_account(account).await?;
            return Ok(user);
        }

        let email = match profile.email.as_deref().map(Email::parse) {
            Some(Ok(email)) => {
                if self.store.find_user_for_login(&email).await?.is_some() {
                    tracing::info!(
                        provider = %profile.provider,
                        "OAuth email already registered; creating user without email"
                    );
                    None
                } else {
                    Some(email)
                }
            }
            _ => None,
        };

        let record = UserRecord {
            email,
            password_digest: None,
            account_type: AccountType::User,
            profile: UserProfile {
                name: profile.name,
                ..UserProfile::default()
            },
        };

        let user = self.store.insert_oauth_user(record, account).await?;
        tracing::info!(user_id = %user.id, provider = %profile.provider, "OAuth user created");
        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(user: &NewUser) -> Result<(), AuthError> {
    match &user.password {
        Some(p) if !p.expose_secret().is_empty() => Ok(()),
        _ => Err(AuthError::WeakPassword("password is required".to_string())),
    }
}
