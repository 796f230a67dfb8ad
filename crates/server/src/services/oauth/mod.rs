//! OAuth 2.0 login against third-party providers.
//!
//! A provider is registered only when both its client ID and secret are
//! configured. The same route starts the flow and receives the callback, so
//! the redirect URI for every provider is
//! `{base_url}/api/auth/login/{provider}`.

mod providers;

pub use providers::{ProviderEndpoints, endpoints, parse_profile};

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use cartwheel_core::OAuthProvider;

use crate::config::{OAuthClientCredentials, OAuthConfig};
use crate::models::oauth::OAuthProfile;
use crate::services::auth::AuthError;

/// Length of the CSRF `state` parameter.
const STATE_LENGTH: usize = 32;

/// Tokens returned by a successful code exchange.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// A configured OAuth client for one provider.
pub struct OAuthClient {
    provider: OAuthProvider,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    endpoints: ProviderEndpoints,
    http: reqwest::Client,
}

impl OAuthClient {
    fn new(
        provider: OAuthProvider,
        credentials: &OAuthClientCredentials,
        base_url: &str,
        http: reqwest::Client,
    ) -> Self {
        Self {
            provider,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: format!("{base_url}/api/auth/login/{provider}"),
            endpoints: endpoints(provider),
            http,
        }
    }

    /// The provider this client talks to.
    #[must_use]
    pub const fn provider(&self) -> OAuthProvider {
        self.provider
    }

    /// The callback URL registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Build the provider's authorization URL.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.endpoints.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(self.endpoints.scope),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the request fails or the provider
    /// returns no access token.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("{} token request failed: {e}", self.provider)))?;

        let status = response.status();
        let body: TokenResponse = response.json().await.map_err(|e| {
            AuthError::OAuth(format!("{} token response ({status}): {e}", self.provider))
        })?;

        match body.access_token {
            Some(token) if status.is_success() => Ok(OAuthTokens {
                access_token: SecretString::from(token),
                refresh_token: body.refresh_token.map(SecretString::from),
            }),
            _ => Err(AuthError::OAuth(format!(
                "{} token exchange failed ({status}): {}",
                self.provider,
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "no access token".to_string())
            ))),
        }
    }

    /// Fetch the user's profile with an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if the request fails or the profile has no
    /// user ID.
    pub async fn fetch_profile(&self, tokens: &OAuthTokens) -> Result<OAuthProfile, AuthError> {
        let response = self
            .http
            .get(self.endpoints.profile_url)
            .bearer_auth(tokens.access_token.expose_secret())
            .header(reqwest::header::USER_AGENT, "Cartwheel/1.0")
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("{} profile request failed: {e}", self.provider)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::OAuth(format!(
                "{} profile request failed ({status}): {text}",
                self.provider
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("{} profile response: {e}", self.provider)))?;

        parse_profile(self.provider, raw)
    }
}

/// The configured OAuth clients, keyed by provider.
pub struct OAuthRegistry {
    clients: BTreeMap<OAuthProvider, OAuthClient>,
}

impl OAuthRegistry {
    /// Register a client for every provider present in `config`.
    #[must_use]
    pub fn new(config: &OAuthConfig, base_url: &str, http: &reqwest::Client) -> Self {
        let clients = config
            .providers
            .iter()
            .map(|(&provider, credentials)| {
                (
                    provider,
                    OAuthClient::new(provider, credentials, base_url, http.clone()),
                )
            })
            .collect();
        Self { clients }
    }

    /// Look up the client for a strategy name from the URL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownStrategy` if the name is not a provider or
    /// the provider is not configured.
    pub fn resolve(&self, strategy: &str) -> Result<&OAuthClient, AuthError> {
        let provider: OAuthProvider = strategy.parse()?;
        self.clients
            .get(&provider)
            .ok_or_else(|| AuthError::UnknownStrategy(strategy.to_string()))
    }

    /// Providers with a registered client.
    pub fn providers(&self) -> impl Iterator<Item = OAuthProvider> + '_ {
        self.clients.keys().copied()
    }
}

/// Generate a random CSRF `state` value.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .filter_map(|_| CHARSET.choose(&mut rng).copied().map(char::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registry() -> OAuthRegistry {
        let mut providers = BTreeMap::new();
        providers.insert(
            OAuthProvider::Github,
            OAuthClientCredentials {
                client_id: "gh-client".to_string(),
                client_secret: SecretString::from("gh-secret-value".to_string()),
            },
        );
        OAuthRegistry::new(
            &OAuthConfig { providers },
            "https://shop.example.com",
            &reqwest::Client::new(),
        )
    }

    #[test]
    fn test_resolve() {
        let registry = registry();
        assert_eq!(
            registry.resolve("github").unwrap().provider(),
            OAuthProvider::Github
        );
        assert!(matches!(
            registry.resolve("google"),
            Err(AuthError::UnknownStrategy(s)) if s == "google"
        ));
        assert!(matches!(
            registry.resolve("myspace"),
            Err(AuthError::UnknownStrategy(_))
        ));
        assert_eq!(registry.providers().collect::<Vec<_>>(), [OAuthProvider::Github]);
    }

    #[test]
    fn test_authorization_url() {
        let registry = registry();
        let client = registry.resolve("github").unwrap();
        assert_eq!(
            client.redirect_uri(),
            "https://shop.example.com/api/auth/login/github"
        );

        let url = client.authorization_url("abc123");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=gh-client"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fshop.example.com%2Fapi%2Fauth%2Flogin%2Fgithub"
        ));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
