//! Password digest type.
//!
//! The plaintext password never reaches this crate; only the salted hash
//! that gets persisted in `users.password_digest`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A salted password hash as stored in the database.
///
/// `Debug` is redacted so digests never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an already-computed hash string.
    #[must_use]
    pub const fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Get the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the inner hash string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest([REDACTED])")
    }
}

impl AsRef<str> for PasswordDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for PasswordDigest {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for PasswordDigest {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PasswordDigest {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for PasswordDigest {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
