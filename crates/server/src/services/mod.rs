//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Signup, local and OAuth login, the password hook
//! - `cart` - Session cart resolution, item edits, login/signup handover
//! - `oauth` - Provider registry, authorization URLs, code exchange

pub mod auth;
pub mod cart;
pub mod oauth;
