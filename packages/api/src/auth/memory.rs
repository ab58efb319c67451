use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use argon2::{Algorithm, Argon2, Params, Version};
use store::{ListenerHandle, Listeners};

use super::password::{hash_password_with, verify_password};
use super::provider::IdentityProvider;
use crate::error::{AuthErrorCode, ProviderError};
use crate::models::{ProfileUpdate, UserInfo};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Provider operations, used for fault injection and call inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderOp {
    CreateIdentity,
    Authenticate,
    AuthenticateFederated,
    UpdateProfile,
    DeleteIdentity,
    EndSession,
}

/// What the Google popup hands back on the next federated sign-in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FederatedAccount {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

struct Account {
    info: UserInfo,
    password_hash: Option<String>,
}

#[derive(Default)]
struct ProviderState {
    accounts: BTreeMap<String, Account>,
    session: Option<String>,
    federated: VecDeque<FederatedAccount>,
    faults: HashMap<ProviderOp, VecDeque<AuthErrorCode>>,
    calls: Vec<ProviderOp>,
}

/// In-memory identity provider for testing, local development and the demo
/// binary. Clones share the same accounts and session.
#[derive(Clone, Default)]
pub struct MemoryIdentityProvider {
    state: Arc<Mutex<ProviderState>>,
    listeners: Listeners<Option<UserInfo>>,
}

impl std::fmt::Debug for MemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryIdentityProvider")
            .field("accounts", &state.accounts.len())
            .field("session", &state.session)
            .finish()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `code`. Queued faults are consumed
    /// in order.
    pub fn fail_next(&self, op: ProviderOp, code: AuthErrorCode) {
        self.state().faults.entry(op).or_default().push_back(code);
    }

    /// Queue the account the next federated sign-in will return.
    pub fn queue_federated(&self, account: FederatedAccount) {
        self.state().federated.push_back(account);
    }

    /// Every operation attempted so far, including failed ones.
    pub fn calls(&self) -> Vec<ProviderOp> {
        self.state().calls.clone()
    }

    pub fn identity(&self, id: &str) -> Option<UserInfo> {
        self.state().accounts.get(id).map(|a| a.info.clone())
    }

    pub fn identity_count(&self) -> usize {
        self.state().accounts.len()
    }

    pub fn set_email_verified(&self, id: &str, verified: bool) {
        if let Some(account) = self.state().accounts.get_mut(id) {
            account.info.email_verified = verified;
        }
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and pop an injected fault for it, if any.
    fn begin(&self, op: ProviderOp) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.calls.push(op);
        match state.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(code) => {
                tracing::debug!(?op, %code, "injected provider failure");
                Err(ProviderError::new(code, "injected failure"))
            }
            None => Ok(()),
        }
    }

    fn sign_in(&self, id: String) -> Option<UserInfo> {
        let user = {
            let mut state = self.state();
            let user = state.accounts.get(&id).map(|a| a.info.clone());
            state.session = Some(id);
            user
        };
        self.listeners.emit(&user);
        user
    }

    fn find_by_email(state: &ProviderState, email: &str) -> Option<String> {
        state
            .accounts
            .iter()
            .find(|(_, a)| a.info.email == email)
            .map(|(id, _)| id.clone())
    }
}

fn hasher() -> Argon2<'static> {
    // Cheap parameters; this provider never holds real credentials.
    let params = Params::new(1024, 1, 1, None).unwrap_or_default();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn create_identity(&self, email: &str, password: &str) -> Result<UserInfo, ProviderError> {
        self.begin(ProviderOp::CreateIdentity)?;

        let email = email.trim().to_lowercase();
        if !valid_email(&email) {
            return Err(ProviderError::new(AuthErrorCode::InvalidEmail, "badly formatted email"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ProviderError::new(AuthErrorCode::WeakPassword, "password too short"));
        }
        if Self::find_by_email(&self.state(), &email).is_some() {
            return Err(ProviderError::new(AuthErrorCode::EmailAlreadyInUse, "email taken"));
        }

        let password_hash = hash_password_with(&hasher(), password)
            .map_err(|e| ProviderError::new(AuthErrorCode::Other("internal-error".into()), e))?;

        let info = UserInfo {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            display_name: None,
            photo_url: None,
            email_verified: false,
            provider: "password".to_string(),
        };
        self.state().accounts.insert(
            info.id.clone(),
            Account {
                info: info.clone(),
                password_hash: Some(password_hash),
            },
        );
        tracing::debug!(id = %info.id, "identity created");
        Ok(info)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<UserInfo, ProviderError> {
        self.begin(ProviderOp::Authenticate)?;

        let email = email.trim().to_lowercase();
        let invalid = || ProviderError::new(AuthErrorCode::InvalidCredential, "invalid credential");

        let (id, hash) = {
            let state = self.state();
            let id = Self::find_by_email(&state, &email).ok_or_else(invalid)?;
            let hash = state
                .accounts
                .get(&id)
                .and_then(|a| a.password_hash.clone())
                .ok_or_else(invalid)?;
            (id, hash)
        };

        let valid = verify_password(password, &hash)
            .map_err(|e| ProviderError::new(AuthErrorCode::Other("internal-error".into()), e))?;
        if !valid {
            return Err(invalid());
        }

        self.sign_in(id).ok_or_else(invalid)
    }

    async fn authenticate_federated(&self) -> Result<UserInfo, ProviderError> {
        self.begin(ProviderOp::AuthenticateFederated)?;

        let Some(account) = self.state().federated.pop_front() else {
            return Err(ProviderError::new(AuthErrorCode::PopupClosedByUser, "popup closed"));
        };
        let email = account.email.trim().to_lowercase();

        let id = {
            let mut state = self.state();
            match Self::find_by_email(&state, &email) {
                Some(id) => {
                    let Some(existing) = state.accounts.get_mut(&id) else {
                        return Err(ProviderError::new(AuthErrorCode::UserNotFound, "vanished"));
                    };
                    if existing.info.provider != "google" {
                        return Err(ProviderError::new(
                            AuthErrorCode::AccountExistsWithDifferentCredential,
                            "email registered with password",
                        ));
                    }
                    // The popup reports the account's current Google profile.
                    existing.info.display_name = account.display_name.clone();
                    existing.info.photo_url = account.photo_url.clone();
                    id
                }
                None => {
                    let info = UserInfo {
                        id: uuid::Uuid::new_v4().to_string(),
                        email,
                        display_name: account.display_name.clone(),
                        photo_url: account.photo_url.clone(),
                        email_verified: true,
                        provider: "google".to_string(),
                    };
                    let id = info.id.clone();
                    state.accounts.insert(
                        id.clone(),
                        Account {
                            info,
                            password_hash: None,
                        },
                    );
                    id
                }
            }
        };

        self.sign_in(id)
            .ok_or_else(|| ProviderError::new(AuthErrorCode::UserNotFound, "vanished"))
    }

    fn current_session(&self) -> Option<UserInfo> {
        let state = self.state();
        state
            .session
            .as_ref()
            .and_then(|id| state.accounts.get(id))
            .map(|a| a.info.clone())
    }

    fn on_session_change(
        &self,
        callback: impl Fn(Option<&UserInfo>) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let callback = Arc::new(callback);
        let forward = Arc::clone(&callback);
        let handle = self.listeners.add(move |user: &Option<UserInfo>| forward(user.as_ref()));
        callback(self.current_session().as_ref());
        handle
    }

    async fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserInfo, ProviderError> {
        self.begin(ProviderOp::UpdateProfile)?;

        let mut state = self.state();
        let account = state
            .accounts
            .get_mut(identity_id)
            .ok_or_else(|| ProviderError::new(AuthErrorCode::UserNotFound, "no such identity"))?;
        if let Some(name) = &update.display_name {
            account.info.display_name = Some(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            account.info.photo_url = Some(photo.clone());
        }
        Ok(account.info.clone())
    }

    async fn delete_identity(&self, identity_id: &str) -> Result<(), ProviderError> {
        self.begin(ProviderOp::DeleteIdentity)?;

        let ended = {
            let mut state = self.state();
            if state.accounts.remove(identity_id).is_none() {
                return Err(ProviderError::new(AuthErrorCode::UserNotFound, "no such identity"));
            }
            let active = state.session.as_deref() == Some(identity_id);
            if active {
                state.session = None;
            }
            active
        };
        if ended {
            self.listeners.emit(&None);
        }
        tracing::debug!(id = identity_id, "identity deleted");
        Ok(())
    }

    async fn end_session(&self) -> Result<(), ProviderError> {
        self.begin(ProviderOp::EndSession)?;
        self.state().session = None;
        self.listeners.emit(&None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_does_not_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let user = provider.create_identity("Ada@Example.com", "secret1").await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.provider, "password");
        assert!(provider.current_session().is_none());
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let provider = MemoryIdentityProvider::new();
        let code = |r: Result<UserInfo, ProviderError>| r.unwrap_err().code;

        assert_eq!(code(provider.create_identity("nope", "secret1").await), AuthErrorCode::InvalidEmail);
        assert_eq!(code(provider.create_identity("a@b.co", "123").await), AuthErrorCode::WeakPassword);

        provider.create_identity("a@b.co", "secret1").await.unwrap();
        assert_eq!(
            code(provider.create_identity("a@b.co", "secret2").await),
            AuthErrorCode::EmailAlreadyInUse
        );
    }

    #[tokio::test]
    async fn test_authenticate_and_end_session() {
        let provider = MemoryIdentityProvider::new();
        provider.create_identity("a@b.co", "secret1").await.unwrap();

        let wrong = provider.authenticate("a@b.co", "secret2").await.unwrap_err();
        assert_eq!(wrong.code, AuthErrorCode::InvalidCredential);

        let user = provider.authenticate("a@b.co", "secret1").await.unwrap();
        assert_eq!(provider.current_session(), Some(user));

        provider.end_session().await.unwrap();
        assert!(provider.current_session().is_none());
    }

    #[tokio::test]
    async fn test_session_change_notifications() {
        let provider = MemoryIdentityProvider::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = provider.on_session_change(move |user| {
            sink.lock().unwrap().push(user.map(|u| u.email.clone()));
        });

        provider.create_identity("a@b.co", "secret1").await.unwrap();
        provider.authenticate("a@b.co", "secret1").await.unwrap();
        provider.end_session().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("a@b.co".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_federated_first_and_returning_login() {
        let provider = MemoryIdentityProvider::new();
        provider.queue_federated(FederatedAccount {
            email: "g@example.com".into(),
            display_name: Some("G".into()),
            photo_url: Some("g.png".into()),
        });
        provider.queue_federated(FederatedAccount {
            email: "g@example.com".into(),
            display_name: Some("G".into()),
            photo_url: None,
        });

        let first = provider.authenticate_federated().await.unwrap();
        assert!(first.email_verified);
        let again = provider.authenticate_federated().await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.photo_url, None);

        let closed = provider.authenticate_federated().await.unwrap_err();
        assert_eq!(closed.code, AuthErrorCode::PopupClosedByUser);
    }

    #[tokio::test]
    async fn test_federated_conflicts_with_password_account() {
        let provider = MemoryIdentityProvider::new();
        provider.create_identity("a@b.co", "secret1").await.unwrap();
        provider.queue_federated(FederatedAccount {
            email: "a@b.co".into(),
            ..Default::default()
        });

        let err = provider.authenticate_federated().await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::AccountExistsWithDifferentCredential);
    }

    #[tokio::test]
    async fn test_injected_fault_is_consumed_once() {
        let provider = MemoryIdentityProvider::new();
        provider.fail_next(ProviderOp::CreateIdentity, AuthErrorCode::NetworkRequestFailed);

        assert!(provider.create_identity("a@b.co", "secret1").await.is_err());
        assert!(provider.create_identity("a@b.co", "secret1").await.is_ok());
        assert_eq!(
            provider.calls(),
            vec![ProviderOp::CreateIdentity, ProviderOp::CreateIdentity]
        );
    }

    #[tokio::test]
    async fn test_delete_active_identity_ends_session() {
        let provider = MemoryIdentityProvider::new();
        let user = provider.create_identity("a@b.co", "secret1").await.unwrap();
        provider.authenticate("a@b.co", "secret1").await.unwrap();

        provider.delete_identity(&user.id).await.unwrap();

        assert!(provider.current_session().is_none());
        assert_eq!(provider.identity_count(), 0);
        assert_eq!(
            provider.delete_identity(&user.id).await.unwrap_err().code,
            AuthErrorCode::UserNotFound
        );
    }
}
