//! Authentication context for the UI.
//!
//! [`AuthProvider`] is the composition root of the signed-in experience. It
//! owns the [`SessionState`], feeds it from the identity provider's session
//! notifications, mirrors it into the [`SessionCache`] and exposes the
//! coordinator's flows with user-facing notifications.

use std::sync::Arc;

use api::auth::IdentityProvider;
use api::{AuthCoordinator, AuthError, UserInfo};
use store::{ListenerHandle, Store};

use crate::error::{FormError, ValidationError};
use crate::guard::NavSignals;
use crate::notifications::Notifications;
use crate::session::{AuthState, SessionCache, SessionState};

/// Signup form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self, min_password_length: usize) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        if self.confirm_password.is_empty() {
            return Err(ValidationError::MissingField("confirm_password"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < min_password_length {
            return Err(ValidationError::PasswordTooShort(min_password_length));
        }
        Ok(())
    }
}

pub struct AuthProvider<P, S> {
    coordinator: AuthCoordinator<P, S>,
    session: SessionState,
    signals: NavSignals,
    notifications: Notifications,
    min_password_length: usize,
    _watch: ListenerHandle,
}

impl<P: IdentityProvider, S: Store> AuthProvider<P, S> {
    pub fn new(
        coordinator: AuthCoordinator<P, S>,
        cache: SessionCache,
        signals: NavSignals,
        notifications: Notifications,
        min_password_length: usize,
    ) -> Self {
        let session = SessionState::new(AuthState {
            cached_user: cache.load(),
            ..AuthState::default()
        });

        let watch = {
            let session = session.clone();
            coordinator.provider().on_session_change(move |user| {
                cache.store(user);
                session.resolve(user.cloned());
            })
        };

        Self {
            coordinator,
            session,
            signals,
            notifications,
            min_password_length,
            _watch: watch,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.session.current()
    }

    pub fn coordinator(&self) -> &AuthCoordinator<P, S> {
        &self.coordinator
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let result = self.coordinator.login(email, password).await;
        self.report(&result, "Successfully logged in!");
        result
    }

    pub async fn login_with_google(&self) -> Result<UserInfo, AuthError> {
        let result = self.coordinator.login_with_google().await;
        self.report(&result, "Successfully logged in with Google!");
        result
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let result = self.coordinator.signup(email, password).await;
        self.report(&result, "Account created successfully!");
        result
    }

    /// Validate the form locally, then sign up.
    pub async fn submit_signup(&self, form: &SignupForm) -> Result<UserInfo, FormError> {
        form.validate(self.min_password_length)?;
        Ok(self.signup(&form.email, &form.password).await?)
    }

    /// End the session. Guards stay quiet while the logout settles.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.signals.begin_logout();
        let result = self.coordinator.logout().await;
        self.report(&result, "Logged out successfully");
        result
    }

    fn report<T>(&self, result: &Result<T, AuthError>, success: &str) {
        match result {
            Ok(_) => self.notifications.success(success),
            Err(e) => self.notifications.error(e.to_string()),
        }
    }
}
