//! Database operations for the Cartwheel `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Local accounts (password and/or OAuth)
//! - `oauths` - Third-party identities linked to a user
//! - `products` - Catalog entries referenced by cart items
//! - `orders` - Carts (`pending`) and completed purchases
//! - `items` - Order lines
//! - `tower_sessions.session` - Session storage
//!
//! Handlers never see a `PgPool` directly. They go through the [`Store`]
//! trait so the same service code runs against [`PgStore`] in production and
//! an in-memory store in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p cartwheel-cli -- migrate
//! ```

pub mod oauth;
pub mod orders;
pub mod users;

#[cfg(test)]
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cartwheel_core::{Email, OAuthProvider, OrderId, ProductId, UserId};

use crate::models::oauth::NewOAuthAccount;
use crate::models::order::{Item, ItemRecord, Order};
use crate::models::user::{User, UserChangesRecord, UserRecord};

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The database driver failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write was rejected by a foreign key, check, length, or numeric
    /// range constraint.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Map a failed write, translating constraint violations into
/// [`RepositoryError::Conflict`] and [`RepositoryError::Rejected`].
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Rejected(format!("{what} references a missing record"));
        }
        // 22001: string_data_right_truncation (VARCHAR length limits)
        // 22003: numeric_value_out_of_range (NUMERIC precision)
        if db_err.is_check_violation()
            || matches!(db_err.code().as_deref(), Some("22001" | "22003"))
        {
            return RepositoryError::Rejected(format!("invalid {what}: {}", db_err.message()));
        }
    }
    RepositoryError::Database(e)
}

/// User persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a prepared user.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: UserRecord) -> Result<User, RepositoryError>;

    /// Apply a prepared partial update. Returns `None` if the user doesn't exist.
    async fn update_user(
        &self,
        id: UserId,
        changes: UserChangesRecord,
    ) -> Result<Option<User>, RepositoryError>;

    /// Get a user by ID. The password digest is not loaded.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Get a user by email, including the password digest.
    async fn find_user_for_login(&self, email: &Email) -> Result<Option<User>, RepositoryError>;
}

/// Order, item, and product persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Create an order with no owner and no items.
    async fn create_order(&self) -> Result<Order, RepositoryError>;

    /// Get an order with its items and each item's product.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Get the pending order owned by `user_id`, if any.
    async fn find_pending_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError>;

    /// Set the owner of an order. Returns the updated order with items, or
    /// `None` if it doesn't exist.
    async fn assign_order(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Add an item to an order, creating its product first when the record
    /// carries new product data.
    async fn insert_item(&self, order_id: OrderId, item: ItemRecord)
    -> Result<Item, RepositoryError>;

    /// Delete every item in `order_id` that references `product_id`.
    /// Returns the number of deleted items.
    async fn delete_items_for_product(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<u64, RepositoryError>;
}

/// OAuth identity persistence.
#[async_trait]
pub trait OAuthStore: Send + Sync {
    /// Get the user linked to a provider identity.
    async fn find_user_by_oauth(
        &self,
        provider: OAuthProvider,
        uid: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Create a user and link the provider identity to it in one transaction.
    async fn insert_oauth_user(
        &self,
        user: UserRecord,
        account: NewOAuthAccount,
    ) -> Result<User, RepositoryError>;

    /// Replace the stored tokens and profile for an existing identity.
    async fn refresh_oauth_account(&self, account: NewOAuthAccount)
    -> Result<(), RepositoryError>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: UserStore + OrderStore + OAuthStore {
    /// Check connectivity (readiness check).
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool (used by the session store).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgFailure {
        code: &'static str,
        kind: ErrorKind,
    }

    impl std::fmt::Display for PgFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "failure {}", self.code)
        }
    }

    impl std::error::Error for PgFailure {}

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "constraint failed"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn failure(code: &'static str, kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(PgFailure { code, kind }))
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        assert!(matches!(
            map_write_error(failure("23505", ErrorKind::UniqueViolation), "user"),
            RepositoryError::Conflict(msg) if msg == "user already exists"
        ));
    }

    #[test]
    fn test_constraint_failures_are_rejected() {
        for (code, kind) in [
            ("23503", ErrorKind::ForeignKeyViolation),
            ("23514", ErrorKind::CheckViolation),
            ("22001", ErrorKind::Other),
            ("22003", ErrorKind::Other),
        ] {
            assert!(
                matches!(
                    map_write_error(failure(code, kind), "product"),
                    RepositoryError::Rejected(_)
                ),
                "{code} should be rejected"
            );
        }
    }

    #[test]
    fn test_other_failures_stay_database_errors() {
        assert!(matches!(
            map_write_error(failure("40001", ErrorKind::Other), "item"),
            RepositoryError::Database(_)
        ));
        assert!(matches!(
            map_write_error(sqlx::Error::PoolTimedOut, "item"),
            RepositoryError::Database(_)
        ));
    }
}
