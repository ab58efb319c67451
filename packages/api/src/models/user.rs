//! # Identity snapshot
//!
//! [`UserInfo`] is the application's copy of a provider identity: a plain
//! value holding only the fields the app reads (id, email, display name,
//! photo, verification flag and the provider that issued it). Provider SDK
//! objects never cross into the rest of the workspace; they are copied into
//! this type at the provider boundary.
//!
//! It is `Serialize + Deserialize` because the session cache persists it to
//! client storage.

use serde::{Deserialize, Serialize};

/// Identity information as seen by the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    /// `"password"` or `"google"`.
    pub provider: String,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Fields of an identity this application may change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            photo_url: None,
        }
    }
}

/// The part of an email address before `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}
