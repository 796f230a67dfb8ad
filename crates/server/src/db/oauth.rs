//! OAuth identity queries for [`PgStore`].

use async_trait::async_trait;
use secrecy::ExposeSecret;

use cartwheel_core::OAuthProvider;

use super::users::USER_COLUMNS;
use super::{OAuthStore, PgStore, RepositoryError, map_write_error};
use crate::models::oauth::NewOAuthAccount;
use crate::models::user::{User, UserRecord};

#[async_trait]
impl OAuthStore for PgStore {
    async fn find_user_by_oauth(
        &self,
        provider: OAuthProvider,
        uid: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE id = (SELECT user_id FROM oauths WHERE provider = $1 AND uid = $2)"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(provider)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_oauth_user(
        &self,
        user: UserRecord,
        account: NewOAuthAccount,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO users (email, account_type, name) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(user.email)
            .bind(user.account_type)
            .bind(user.profile.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "user"))?;

        sqlx::query(
            "INSERT INTO oauths (provider, uid, access_token, refresh_token, profile, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(account.provider)
        .bind(&account.uid)
        .bind(account.access_token.expose_secret())
        .bind(account.refresh_token.as_ref().map(|t| t.expose_secret().to_owned()))
        .bind(&account.profile)
        .bind(created.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "oauth identity"))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn refresh_oauth_account(
        &self,
        account: NewOAuthAccount,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE oauths SET access_token = $3, refresh_token = COALESCE($4, refresh_token), \
             profile = $5, updated_at = now() \
             WHERE provider = $1 AND uid = $2",
        )
        .bind(account.provider)
        .bind(&account.uid)
        .bind(account.access_token.expose_secret())
        .bind(account.refresh_token.as_ref().map(|t| t.expose_secret().to_owned()))
        .bind(&account.profile)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
