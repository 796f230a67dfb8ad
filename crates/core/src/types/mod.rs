//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod provider;
pub mod status;

pub use credential::PasswordDigest;
pub use email::{Email, EmailError};
pub use id::*;
pub use provider::{OAuthProvider, UnknownProvider};
pub use status::*;
