//! # API crate: authentication and profile consistency for the notes app
//!
//! This crate owns everything that talks to the identity provider and keeps
//! the application's profile records in step with it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | The [`auth::IdentityProvider`] contract, an in-memory provider, Argon2 password hashing, Google OAuth request building |
//! | [`coordinator`] | [`AuthCoordinator`]: signup, password login, Google login and logout with compensating rollback |
//! | [`error`] | Raw provider failures ([`ProviderError`]) and the normalized, user-facing [`AuthError`] |
//! | [`models`] | The [`UserInfo`] identity snapshot and the [`Profile`] record stored at `profiles/{id}` |

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod models;

pub use coordinator::AuthCoordinator;
pub use error::{AuthError, AuthErrorCode, ProviderError};
pub use models::{Profile, ProfileUpdate, UserInfo};
