//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! cw-cli user create -e shopper@example.com -p hunter22 -n "Shopper Name"
//! ```
//!
//! Goes through the same pre-persist hook as signup: the email is
//! lowercased and the password is hashed with bcrypt.

use cartwheel_core::{AccountType, UserId};
use cartwheel_server::db::{PgStore, RepositoryError, UserStore, create_pool};
use cartwheel_server::models::{NewUser, UserProfile};
use secrecy::SecretString;

use super::{CommandError, database_url};

/// Create a user with a password.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error for a malformed email, an empty password, a taken email
/// or a database failure.
pub async fn create_user(
    email: String,
    password: String,
    name: Option<String>,
    account_type: AccountType,
) -> Result<UserId, CommandError> {
    if password.is_empty() {
        return Err(CommandError::User("password must not be empty".to_string()));
    }

    let record = NewUser {
        email: Some(email),
        password: Some(SecretString::from(password)),
        account_type,
        profile: UserProfile {
            name,
            ..UserProfile::default()
        },
    }
    .prepare()
    .await
    .map_err(|e| CommandError::User(e.to_string()))?;

    let pool = create_pool(&database_url()?).await?;
    let store = PgStore::new(pool);

    let user = store.insert_user(record).await.map_err(|e| match e {
        RepositoryError::Database(e) => CommandError::Database(e),
        other => CommandError::User(other.to_string()),
    })?;

    tracing::info!(
        user_id = %user.id,
        email = ?user.email.as_ref().map(cartwheel_core::Email::as_str),
        %account_type,
        "User created"
    );

    Ok(user.id)
}
