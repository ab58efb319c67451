//! # Profile record
//!
//! Application-owned data kept 1:1 with an identity at `profiles/{id}`:
//!
//! ```json
//! { "id": "…", "email": "…", "displayName": "…", "photoURL": "…",
//!   "createdAt": 1700000000000, "lastLogin": 1700000000000 }
//! ```
//!
//! Fields the app does not know about are kept in [`Profile::extra`] so a
//! merge never drops data written by someone else.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::user::{email_local_part, UserInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_login: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Record written on email/password signup.
    pub fn for_signup(identity: &UserInfo, display_name: String, now_ms: i64) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            display_name,
            photo_url: String::new(),
            created_at: now_ms,
            last_login: now_ms,
            extra: Map::new(),
        }
    }

    /// Record written on a first federated login.
    pub fn for_first_login(identity: &UserInfo, default_name: &str, now_ms: i64) -> Self {
        let display_name = non_empty(identity.display_name.as_deref())
            .or_else(|| non_empty(Some(email_local_part(&identity.email))))
            .unwrap_or(default_name)
            .to_string();
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            display_name,
            photo_url: identity.photo_url.clone().unwrap_or_default(),
            created_at: now_ms,
            last_login: now_ms,
            extra: Map::new(),
        }
    }

    /// Fold a returning federated login into the stored record.
    ///
    /// `lastLogin` is refreshed; email, display name and photo take the
    /// provider's value only when it is non-empty.
    pub fn merge_login(mut self, identity: &UserInfo, now_ms: i64) -> Self {
        self.id = identity.id.clone();
        self.last_login = now_ms;
        if let Some(email) = non_empty(Some(identity.email.as_str())) {
            self.email = email.to_string();
        }
        if let Some(name) = non_empty(identity.display_name.as_deref()) {
            self.display_name = name.to_string();
        }
        if let Some(photo) = non_empty(identity.photo_url.as_deref()) {
            self.photo_url = photo.to_string();
        }
        self
    }
}

/// `value` unless it is missing or blank.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
