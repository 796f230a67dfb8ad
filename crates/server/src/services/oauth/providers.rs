//! Per-provider endpoints and profile parsing.

use serde_json::Value;

use cartwheel_core::OAuthProvider;

use crate::models::oauth::OAuthProfile;
use crate::services::auth::AuthError;

/// OAuth 2.0 endpoints and requested scope for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub profile_url: &'static str,
    pub scope: &'static str,
}

/// Endpoints for `provider`.
#[must_use]
pub const fn endpoints(provider: OAuthProvider) -> ProviderEndpoints {
    match provider {
        OAuthProvider::Facebook => ProviderEndpoints {
            authorize_url: "https://www.facebook.com/v19.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/v19.0/me?fields=id,name,email",
            scope: "email",
        },
        OAuthProvider::Google => ProviderEndpoints {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            profile_url: "https://openidconnect.googleapis.com/v1/userinfo",
            scope: "openid email profile",
        },
        OAuthProvider::Github => ProviderEndpoints {
            authorize_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            profile_url: "https://api.github.com/user",
            scope: "user:email",
        },
    }
}

/// Extract the stable user ID, email, and display name from a provider's
/// profile response.
///
/// # Errors
///
/// Returns `AuthError::OAuth` if the response carries no user ID.
pub fn parse_profile(provider: OAuthProvider, raw: Value) -> Result<OAuthProfile, AuthError> {
    let id_field = match provider {
        OAuthProvider::Google => "sub",
        OAuthProvider::Facebook | OAuthProvider::Github => "id",
    };

    // GitHub IDs are numbers, the others strings.
    let uid = match raw.get(id_field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(AuthError::OAuth(format!(
                "{provider} profile has no `{id_field}`"
            )));
        }
    };

    let text = |key: &str| {
        raw.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let email = text("email");
    let name = text("name").or_else(|| text("login"));

    Ok(OAuthProfile {
        provider,
        uid,
        email,
        name,
        raw,
    })
}
