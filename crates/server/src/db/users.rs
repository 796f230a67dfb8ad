//! User queries for [`PgStore`].
//!
//! The password digest is selected only by [`UserStore::find_user_for_login`];
//! every other query returns `NULL` in its place.

use async_trait::async_trait;

use cartwheel_core::{Email, UserId};

use super::{PgStore, RepositoryError, UserStore, map_write_error};
use crate::models::user::{User, UserChangesRecord, UserRecord};

/// Columns for a [`User`] row without the digest.
pub(super) const USER_COLUMNS: &str = "id, email, account_type, name, street_address, city, \
     state, zip, card_number, exp_month, exp_year, card_type, cvv, \
     NULL::text AS password_digest, created_at, updated_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: UserRecord) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (email, account_type, name, street_address, city, state, zip, \
             card_number, exp_month, exp_year, card_type, cvv, password_digest) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {USER_COLUMNS}"
        );
        let p = user.profile;

        sqlx::query_as::<_, User>(&sql)
            .bind(user.email)
            .bind(user.account_type)
            .bind(p.name)
            .bind(p.street_address)
            .bind(p.city)
            .bind(p.state)
            .bind(p.zip)
            .bind(p.card_number)
            .bind(p.exp_month)
            .bind(p.exp_year)
            .bind(p.card_type)
            .bind(p.cvv)
            .bind(user.password_digest)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "user"))
    }

    async fn update_user(
        &self,
        id: UserId,
        changes: UserChangesRecord,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "UPDATE users SET \
             email = COALESCE($2, email), \
             password_digest = COALESCE($3, password_digest), \
             name = COALESCE($4, name), \
             street_address = COALESCE($5, street_address), \
             city = COALESCE($6, city), \
             state = COALESCE($7, state), \
             zip = COALESCE($8, zip), \
             card_number = COALESCE($9, card_number), \
             exp_month = COALESCE($10, exp_month), \
             exp_year = COALESCE($11, exp_year), \
             card_type = COALESCE($12, card_type), \
             cvv = COALESCE($13, cvv), \
             updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let p = changes.profile;

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.password_digest)
            .bind(p.name)
            .bind(p.street_address)
            .bind(p.city)
            .bind(p.state)
            .bind(p.zip)
            .bind(p.card_number)
            .bind(p.exp_month)
            .bind(p.exp_year)
            .bind(p.card_type)
            .bind(p.cvv)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, "user"))
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_for_login(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, email, account_type, name, street_address, city, state, zip, \
             card_number, exp_month, exp_year, card_type, cvv, password_digest, \
             created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }
}
