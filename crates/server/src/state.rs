//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::services::oauth::OAuthRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, configuration, and OAuth clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    oauth: OAuthRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Registers an OAuth client for every provider configured in `config`.
    #[must_use]
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let http = reqwest::Client::new();
        let oauth = OAuthRegistry::new(&config.oauth, &config.base_url, &http);

        for provider in oauth.providers() {
            tracing::info!(%provider, "OAuth strategy enabled");
        }

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                oauth,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the OAuth client registry.
    #[must_use]
    pub fn oauth(&self) -> &OAuthRegistry {
        &self.inner.oauth
    }
}
