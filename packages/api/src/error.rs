//! # Authentication errors
//!
//! Two layers:
//!
//! - [`ProviderError`] is what an [`IdentityProvider`](crate::auth::IdentityProvider)
//!   reports. It carries an [`AuthErrorCode`] parsed from the provider's
//!   `auth/...` code string plus the provider's own message.
//! - [`AuthError`] is what the [`AuthCoordinator`](crate::AuthCoordinator)
//!   returns. Its `Display` output is the message shown to the user; raw
//!   provider codes and messages never leak through it.

use std::fmt;

use thiserror::Error;

/// Provider failure codes the application distinguishes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword,
    OperationNotAllowed,
    NetworkRequestFailed,
    PopupClosedByUser,
    CancelledPopupRequest,
    PopupBlocked,
    AccountExistsWithDifferentCredential,
    InvalidCredential,
    UserNotFound,
    WrongPassword,
    Other(String),
}

impl AuthErrorCode {
    /// Parse a provider code, with or without the `auth/` prefix.
    pub fn parse(code: &str) -> Self {
        match code.strip_prefix("auth/").unwrap_or(code) {
            "email-already-in-use" => Self::EmailAlreadyInUse,
            "invalid-email" => Self::InvalidEmail,
            "weak-password" => Self::WeakPassword,
            "operation-not-allowed" => Self::OperationNotAllowed,
            "network-request-failed" => Self::NetworkRequestFailed,
            "popup-closed-by-user" => Self::PopupClosedByUser,
            "cancelled-popup-request" => Self::CancelledPopupRequest,
            "popup-blocked" => Self::PopupBlocked,
            "account-exists-with-different-credential" => Self::AccountExistsWithDifferentCredential,
            "invalid-credential" => Self::InvalidCredential,
            "user-not-found" => Self::UserNotFound,
            "wrong-password" => Self::WrongPassword,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "email-already-in-use",
            Self::InvalidEmail => "invalid-email",
            Self::WeakPassword => "weak-password",
            Self::OperationNotAllowed => "operation-not-allowed",
            Self::NetworkRequestFailed => "network-request-failed",
            Self::PopupClosedByUser => "popup-closed-by-user",
            Self::CancelledPopupRequest => "cancelled-popup-request",
            Self::PopupBlocked => "popup-blocked",
            Self::AccountExistsWithDifferentCredential => "account-exists-with-different-credential",
            Self::InvalidCredential => "invalid-credential",
            Self::UserNotFound => "user-not-found",
            Self::WrongPassword => "wrong-password",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auth/{}", self.as_str())
    }
}

/// A failure reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Normalized authentication failure. `Display` is the user-facing message.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("This email is already in use. Please use a different email or sign in.")]
    IdentityAlreadyExists,
    #[error("Please enter a valid email address.")]
    InvalidIdentifier,
    #[error("Password should be at least {0} characters long.")]
    WeakCredential(usize),
    #[error("Email/password accounts are not enabled.")]
    OperationDisallowed,
    #[error("Network error. Please check your connection and try again.")]
    NetworkFailure,
    #[error("Sign in was cancelled. Please try again.")]
    PopupCancelled,
    #[error("Popup was blocked. Please allow popups for this site and try again.")]
    PopupBlocked,
    #[error("An account already exists with the same email but different sign-in credentials.")]
    CredentialConflict,
    #[error("Invalid email or password.")]
    InvalidCredentials,

    // Generic failures
    #[error("Failed to complete user setup. Please try again.")]
    SetupFailed,
    #[error("Failed to complete sign in. Please try again.")]
    SignInIncomplete,
    #[error("Failed to create account. Please try again later.")]
    SignupFailed,
    #[error("Failed to sign in with Google. Please try again.")]
    FederatedSignInFailed,
    #[error("Failed to log in. Please try again.")]
    LoginFailed,
    #[error("Failed to log out. Please try again.")]
    LogoutFailed,
}

impl AuthError {
    /// Map a failed identity creation.
    pub fn from_signup(err: &ProviderError, min_password_length: usize) -> Self {
        match err.code {
            AuthErrorCode::EmailAlreadyInUse => Self::IdentityAlreadyExists,
            AuthErrorCode::InvalidEmail => Self::InvalidIdentifier,
            AuthErrorCode::WeakPassword => Self::WeakCredential(min_password_length),
            AuthErrorCode::OperationNotAllowed => Self::OperationDisallowed,
            _ => Self::SignupFailed,
        }
    }

    /// Map a failed federated sign-in.
    pub fn from_federated(err: &ProviderError) -> Self {
        match err.code {
            AuthErrorCode::AccountExistsWithDifferentCredential => Self::CredentialConflict,
            AuthErrorCode::PopupClosedByUser | AuthErrorCode::CancelledPopupRequest => {
                Self::PopupCancelled
            }
            AuthErrorCode::NetworkRequestFailed => Self::NetworkFailure,
            AuthErrorCode::PopupBlocked => Self::PopupBlocked,
            _ => Self::FederatedSignInFailed,
        }
    }

    /// Map a failed email/password sign-in.
    pub fn from_login(err: &ProviderError) -> Self {
        match err.code {
            AuthErrorCode::InvalidCredential
            | AuthErrorCode::UserNotFound
            | AuthErrorCode::WrongPassword => Self::InvalidCredentials,
            AuthErrorCode::InvalidEmail => Self::InvalidIdentifier,
            AuthErrorCode::NetworkRequestFailed => Self::NetworkFailure,
            _ => Self::LoginFailed,
        }
    }

    /// True for the catch-all variants that carry no specific cause.
    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            Self::SetupFailed
                | Self::SignInIncomplete
                | Self::SignupFailed
                | Self::FederatedSignInFailed
                | Self::LoginFailed
                | Self::LogoutFailed
        )
    }
}
