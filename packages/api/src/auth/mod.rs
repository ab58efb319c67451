//! Authentication: the identity provider contract and its helpers.

mod config;
mod google;
mod memory;
mod password;
mod provider;

pub use config::{OAuthConfig, OAuthError};
pub use google::{AuthorizationRequest, GoogleOAuth};
pub use memory::{FederatedAccount, MemoryIdentityProvider, ProviderOp};
pub use password::{hash_password, hash_password_with, verify_password};
pub use provider::IdentityProvider;
