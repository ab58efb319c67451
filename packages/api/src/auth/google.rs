//! # Google OAuth 2.0 authorization request
//!
//! Federated sign-in starts by sending the browser to Google's consent page.
//! [`GoogleOAuth::authorization_request`] builds that URL with the `openid`,
//! `email` and `profile` scopes and a fresh PKCE challenge, and hands back
//! the CSRF state and PKCE verifier the caller must keep until the callback
//! arrives. The code exchange itself belongs to the hosted identity provider.
//!
//! [`crate::auth::MemoryIdentityProvider`] stands in for the whole popup, so
//! only a real redirect flow (and the `notes` demo) uses this builder.

use oauth2::basic::BasicClient;
use oauth2::{CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge, Scope};

use super::config::{OAuthConfig, OAuthError};

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// A consent-page URL plus the secrets needed to finish the flow.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Google OAuth handler.
pub struct GoogleOAuth {
    config: OAuthConfig,
}

impl GoogleOAuth {
    /// Create a handler configured from the environment.
    pub fn new() -> Result<Self, OAuthError> {
        Ok(Self::with_config(OAuthConfig::google()?))
    }

    pub fn with_config(config: OAuthConfig) -> Self {
        Self { config }
    }

    fn create_client(&self) -> ConfiguredClient {
        BasicClient::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url.clone())
    }

    /// Build the authorization URL with PKCE.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let client = self.create_client();
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth() -> GoogleOAuth {
        let config = OAuthConfig::google_with(
            "client-123".into(),
            "shh".into(),
            "http://localhost:8080/auth/google/callback".into(),
        )
        .unwrap();
        GoogleOAuth::with_config(config)
    }

    #[test]
    fn test_authorization_url() {
        let request = oauth().authorization_request();

        assert!(request.url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(request.url.contains("client_id=client-123"));
        assert!(request.url.contains("code_challenge_method=S256"));
        assert!(request.url.contains("scope=openid+email+profile"));
        assert!(request.url.contains(&format!("state={}", request.csrf_state)));
        assert!(!request.pkce_verifier.is_empty());
    }

    #[test]
    fn test_each_request_gets_fresh_state() {
        let oauth = oauth();
        let a = oauth.authorization_request();
        let b = oauth.authorization_request();
        assert_ne!(a.csrf_state, b.csrf_state);
        assert_ne!(a.pkce_verifier, b.pkce_verifier);
    }

    #[test]
    fn test_invalid_redirect_rejected() {
        let err = OAuthConfig::google_with("id".into(), "secret".into(), "not a url".into());
        assert!(matches!(err, Err(OAuthError::InvalidUrl(_))));
    }
}
