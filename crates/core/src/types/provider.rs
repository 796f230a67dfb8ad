//! Third-party identity providers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a strategy name does not match a known provider.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown OAuth provider: {0}")]
pub struct UnknownProvider(pub String);

/// An OAuth identity provider supported by the login flow.
///
/// The lowercase name doubles as the URL segment in
/// `/api/auth/login/{provider}` and as the prefix of its environment
/// variables (`GITHUB_CLIENT_ID`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "oauth_provider", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Facebook,
    Google,
    Github,
}

impl OAuthProvider {
    /// Every supported provider, in registration order.
    pub const ALL: [Self; 3] = [Self::Facebook, Self::Google, Self::Github];

    /// Lowercase provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    /// Prefix of this provider's environment variables.
    #[must_use]
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Facebook => "FACEBOOK",
            Self::Google => "GOOGLE",
            Self::Github => "GITHUB",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_owned()))
    }
}
