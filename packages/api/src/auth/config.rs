//! OAuth configuration from environment variables.

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use thiserror::Error;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} not set")]
    MissingVar(&'static str),
    #[error("invalid OAuth URL: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),
}

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
}

impl OAuthConfig {
    /// Create Google OAuth config from environment variables.
    pub fn google() -> Result<Self, OAuthError> {
        dotenvy::dotenv().ok();

        let client_id =
            std::env::var("GOOGLE_CLIENT_ID").map_err(|_| OAuthError::MissingVar("GOOGLE_CLIENT_ID"))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| OAuthError::MissingVar("GOOGLE_CLIENT_SECRET"))?;
        let redirect_uri = std::env::var("AUTH_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8080/auth/google/callback".to_string());

        Self::google_with(client_id, client_secret, redirect_uri)
    }

    /// Google OAuth config from explicit values.
    pub fn google_with(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Result<Self, OAuthError> {
        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
            token_url: TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?,
            redirect_url: RedirectUrl::new(redirect_uri)?,
        })
    }
}
