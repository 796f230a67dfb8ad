//! User domain types.
//!
//! `NewUser` and `UserChanges` hold raw request data, including the
//! plaintext password. Calling `prepare()` runs the pre-persist hook: the
//! email is lowercased and validated and a non-empty password is replaced by
//! its bcrypt digest. Only the resulting records reach a store, so a
//! plaintext password is never persisted.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use cartwheel_core::{AccountType, Email, PasswordDigest, UserId};

use crate::services::auth::{AuthError, password};

/// Optional contact and payment details on a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub name: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub card_number: Option<String>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
    pub card_type: Option<String>,
    pub cvv: Option<String>,
}

/// A stored user.
///
/// `password_digest` is only loaded for login and is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    /// Lowercased. `None` for OAuth users whose provider shared no email.
    pub email: Option<Email>,
    pub account_type: AccountType,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub profile: UserProfile,
    #[serde(skip)]
    pub password_digest: Option<PasswordDigest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check a plaintext password against the stored digest.
    ///
    /// Users without a digest (OAuth-only accounts, or loaded without the
    /// digest) never authenticate.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the digest is malformed.
    pub async fn authenticate(&self, plaintext: &str) -> Result<bool, AuthError> {
        match &self.password_digest {
            Some(digest) => password::verify_password(plaintext, digest).await,
            None => Ok(false),
        }
    }
}

/// Request data for creating a user.
#[derive(Debug, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub account_type: AccountType,
    pub profile: UserProfile,
}

impl NewUser {
    /// Run the pre-persist hook.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email and
    /// `AuthError::PasswordHash` if hashing fails.
    pub async fn prepare(self) -> Result<UserRecord, AuthError> {
        Ok(UserRecord {
            email: normalize_email(self.email.as_deref())?,
            password_digest: digest_password(self.password).await?,
            account_type: self.account_type,
            profile: self.profile,
        })
    }
}

/// A user ready to insert.
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub email: Option<Email>,
    pub password_digest: Option<PasswordDigest>,
    pub account_type: AccountType,
    pub profile: UserProfile,
}

/// Partial update to a user. `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub profile: UserProfile,
}

impl UserChanges {
    /// Run the pre-persist hook on the changed fields.
    ///
    /// # Errors
    ///
    /// Same as [`NewUser::prepare`].
    pub async fn prepare(self) -> Result<UserChangesRecord, AuthError> {
        Ok(UserChangesRecord {
            email: normalize_email(self.email.as_deref())?,
            password_digest: digest_password(self.password).await?,
            profile: self.profile,
        })
    }
}

/// A partial update ready to apply.
#[derive(Debug, Clone, Default)]
pub struct UserChangesRecord {
    pub email: Option<Email>,
    pub password_digest: Option<PasswordDigest>,
    pub profile: UserProfile,
}

fn normalize_email(raw: Option<&str>) -> Result<Option<Email>, AuthError> {
    raw.map(Email::parse)
        .transpose()
        .map_err(AuthError::InvalidEmail)
}

// An empty password counts as no password.
async fn digest_password(
    password: Option<SecretString>,
) -> Result<Option<PasswordDigest>, AuthError> {
    match password {
        Some(p) if !p.expose_secret().is_empty() => password::hash_password(p).await.map(Some),
        _ => Ok(None),
    }
}
