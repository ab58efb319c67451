//! # Application configuration: `notes.toml`
//!
//! Every tunable of the notes app lives in one TOML file. All sections are
//! optional; a missing file or an empty one is equivalent to the defaults.
//!
//! ```toml
//! [store]
//! notes_path = "notes"          # collection holding note records
//! profiles_path = "profiles"    # collection holding profile records
//!
//! [auth]
//! min_password_length = 6
//! default_display_name = "User"
//! admin_emails = ["admin@example.com"]
//!
//! [routes]
//! login = "/login"
//! signup = "/signup"
//! verify_email = "/verify-email"
//! unauthorized = "/unauthorized"
//! after_login = "/notes"
//! logout_signal_ttl_ms = 1000
//!
//! [notifications]
//! display_ms = 3000               # how long a toast stays visible
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub routes: RouteConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Where records live in the tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub notes_path: String,
    pub profiles_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notes_path: "notes".to_string(),
            profiles_path: "profiles".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub min_password_length: usize,
    /// Used when no display name can be derived from the email.
    pub default_display_name: String,
    /// Identities allowed through admin-only routes.
    pub admin_emails: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            default_display_name: "User".to_string(),
            admin_emails: vec!["admin@example.com".to_string()],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub login: String,
    pub signup: String,
    pub verify_email: String,
    pub unauthorized: String,
    pub after_login: String,
    /// How long a started logout suppresses the sign-in notice.
    pub logout_signal_ttl_ms: i64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            signup: "/signup".to_string(),
            verify_email: "/verify-email".to_string(),
            unauthorized: "/unauthorized".to_string(),
            after_login: "/notes".to_string(),
            logout_signal_ttl_ms: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// A toast is visible, and dedupes by id, for this long.
    pub display_ms: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { display_ms: 3000 }
    }
}

impl RouteConfig {
    /// Sign-in and sign-up pages, reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        path == self.login || path == self.signup
    }
}

impl AppConfig {
    /// The conventional config filename.
    pub fn filename() -> &'static str {
        "notes.toml"
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::from_toml(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
