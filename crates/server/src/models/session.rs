//! Session keys.
//!
//! The session holds identifiers only. The user and cart are reloaded from
//! the store on every request that needs them.

/// Session keys for authentication and cart state.
pub mod keys {
    /// Key for the logged-in user's ID (`UserId`).
    pub const USER_ID: &str = "user_id";

    /// Key for the session cart's order ID (`OrderId`).
    pub const CART_ID: &str = "cart_id";

    /// Key for the pending OAuth `state` parameter (CSRF protection).
    /// Stored as `(OAuthProvider, String)`.
    pub const OAUTH_STATE: &str = "oauth_state";
}
