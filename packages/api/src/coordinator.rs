//! # Session consistency coordinator
//!
//! An identity lives in the identity provider; its profile record lives in the
//! tree store. Neither service can commit both, so [`AuthCoordinator`] runs
//! the steps strictly one after another and, when a later step fails, tries
//! to undo the earlier ones.
//!
//! ## Signup
//!
//! 1. create the identity (failures mapped, nothing to undo)
//! 2. derive the display name from the email's local part
//! 3. write `profiles/{id}`; on failure delete the identity
//! 4. set the identity's display name; on failure erase the profile and delete the identity
//! 5. sign in with the same credentials; on failure, same as 4
//!
//! ## Google login
//!
//! Sign in through the popup, then create or merge `profiles/{id}`. If
//! anything after the popup fails, the session is ended and, when no profile
//! exists for the identity, the identity is deleted too. Returning users keep
//! their identity.
//!
//! Compensation is best effort: a failed undo is logged and swallowed, never
//! retried, so a double failure can leave an identity without a profile. The
//! caller always sees a single normalized [`AuthError`].

use std::sync::Arc;

use store::{AppConfig, AuthConfig, Clock, Store, StoreError};
use thiserror::Error;

use crate::auth::IdentityProvider;
use crate::error::{AuthError, ProviderError};
use crate::models::{email_local_part, non_empty, Profile, ProfileUpdate, UserInfo};

/// Why a multi-step flow stopped.
#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub struct AuthCoordinator<P, S> {
    provider: Arc<P>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    auth: AuthConfig,
    profiles_path: String,
}

impl<P: IdentityProvider, S: Store> AuthCoordinator<P, S> {
    pub fn new(provider: Arc<P>, store: Arc<S>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self {
            provider,
            store,
            clock,
            auth: config.auth.clone(),
            profiles_path: config.store.profiles_path.clone(),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    fn profile_path(&self, identity_id: &str) -> String {
        store::tree::child_path(&self.profiles_path, identity_id)
    }

    /// Display name for a new email/password account.
    pub fn derive_display_name(&self, email: &str) -> String {
        let local = email_local_part(email);
        if local.is_empty() {
            self.auth.default_display_name.clone()
        } else {
            local.to_string()
        }
    }

    async fn write_profile(&self, path: &str, profile: &Profile) -> Result<(), StoreError> {
        let value = serde_json::to_value(profile).map_err(|e| StoreError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        self.store.write(path, value).await
    }

    /// Create an account, its profile record and a session.
    pub async fn signup(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let email = email.trim();
        let min = self.auth.min_password_length;
        if email.is_empty() {
            return Err(AuthError::InvalidIdentifier);
        }
        if password.chars().count() < min {
            return Err(AuthError::WeakCredential(min));
        }

        let identity = self
            .provider
            .create_identity(email, password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "identity creation failed");
                AuthError::from_signup(&e, min)
            })?;

        let display_name = self.derive_display_name(email);
        let path = self.profile_path(&identity.id);
        let profile = Profile::for_signup(&identity, display_name.clone(), self.clock.now_ms());

        if let Err(e) = self.write_profile(&path, &profile).await {
            tracing::error!(error = %e, id = %identity.id, "profile write failed during signup");
            self.rollback_identity(&identity.id).await;
            return Err(AuthError::SetupFailed);
        }

        match self.finish_signup(&identity, email, password, display_name).await {
            Ok(session) => {
                tracing::info!(id = %session.id, "account created");
                Ok(session)
            }
            Err(e) => {
                tracing::error!(error = %e, id = %identity.id, "signup setup failed");
                self.erase_profile(&path).await;
                self.rollback_identity(&identity.id).await;
                Err(AuthError::SetupFailed)
            }
        }
    }

    async fn finish_signup(
        &self,
        identity: &UserInfo,
        email: &str,
        password: &str,
        display_name: String,
    ) -> Result<UserInfo, ProviderError> {
        self.provider
            .update_profile(&identity.id, &ProfileUpdate::display_name(display_name))
            .await?;
        self.provider.authenticate(email, password).await
    }

    /// Email/password sign-in.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .provider
            .authenticate(email.trim(), password)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "sign in failed");
                AuthError::from_login(&e)
            })?;
        tracing::info!(id = %user.id, "signed in");
        Ok(user)
    }

    /// Google sign-in with profile creation or merge.
    pub async fn login_with_google(&self) -> Result<UserInfo, AuthError> {
        let identity = self.provider.authenticate_federated().await.map_err(|e| {
            tracing::warn!(error = %e, "google sign-in failed");
            AuthError::from_federated(&e)
        })?;

        if let Err(e) = self.sync_federated_profile(&identity).await {
            tracing::error!(error = %e, id = %identity.id, "failed to update profile after google sign-in");
            if let Err(e) = self.provider.end_session().await {
                tracing::error!(error = %e, "failed to sign out after profile error");
            }
            self.rollback_new_federated(&identity).await;
            return Err(AuthError::SignInIncomplete);
        }

        tracing::info!(id = %identity.id, "signed in with google");
        Ok(self.provider.current_session().unwrap_or(identity))
    }

    async fn sync_federated_profile(&self, identity: &UserInfo) -> Result<(), StepError> {
        let path = self.profile_path(&identity.id);
        let now = self.clock.now_ms();

        let existing = self.store.read(&path).await?.deserialize::<Profile>()?;
        let is_new = existing.is_none();
        let profile = match existing {
            Some(stored) => stored.merge_login(identity, now),
            None => Profile::for_first_login(identity, &self.auth.default_display_name, now),
        };

        self.write_profile(&path, &profile).await?;

        if let (true, Some(name)) = (is_new, non_empty(identity.display_name.as_deref())) {
            let update = ProfileUpdate {
                display_name: Some(name.to_string()),
                photo_url: Some(identity.photo_url.clone().unwrap_or_default()),
            };
            self.provider.update_profile(&identity.id, &update).await?;
        }
        Ok(())
    }

    /// Delete a federated identity only if it never got a profile.
    async fn rollback_new_federated(&self, identity: &UserInfo) {
        let path = self.profile_path(&identity.id);
        match self.store.read(&path).await {
            Ok(snapshot) if snapshot.exists() => {
                tracing::info!(id = %identity.id, "profile exists, keeping identity");
            }
            Ok(_) => self.rollback_identity(&identity.id).await,
            Err(e) => {
                tracing::error!(error = %e, id = %identity.id, "could not check profile during rollback");
            }
        }
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.provider.end_session().await.map_err(|e| {
            tracing::error!(error = %e, "sign out failed");
            AuthError::LogoutFailed
        })?;
        tracing::info!("signed out");
        Ok(())
    }

    async fn rollback_identity(&self, identity_id: &str) {
        match self.provider.delete_identity(identity_id).await {
            Ok(()) => tracing::info!(id = identity_id, "rolled back identity creation"),
            Err(e) => tracing::error!(error = %e, id = identity_id, "failed to roll back identity creation"),
        }
    }

    async fn erase_profile(&self, path: &str) {
        if let Err(e) = self.store.delete(path).await {
            tracing::error!(error = %e, path, "failed to erase profile during rollback");
        }
    }
}
