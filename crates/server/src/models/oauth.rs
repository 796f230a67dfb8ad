//! OAuth identity types.

use secrecy::SecretString;

use cartwheel_core::OAuthProvider;

/// Profile data fetched from a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    /// The provider's stable user ID.
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// The provider's raw profile response.
    pub raw: serde_json::Value,
}

/// An identity to link (or refresh) after login.
#[derive(Debug, Clone)]
pub struct NewOAuthAccount {
    pub provider: OAuthProvider,
    pub uid: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub profile: serde_json::Value,
}
