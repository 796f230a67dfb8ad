//! Domain models for the Cartwheel backend.
//!
//! Row types double as domain types: each derives `sqlx::FromRow` for the
//! `PostgreSQL` store and `Serialize` for JSON responses. Input types
//! (`NewUser`, `NewItem`, ...) carry unvalidated request data and are turned
//! into `*Record` types before they reach a store.

pub mod oauth;
pub mod order;
pub mod session;
pub mod user;

pub use oauth::{NewOAuthAccount, OAuthProfile};
pub use order::{Item, ItemRecord, NewItem, NewProduct, Order, Product, ProductRef};
pub use session::keys;
pub use user::{NewUser, User, UserChanges, UserChangesRecord, UserProfile, UserRecord};
