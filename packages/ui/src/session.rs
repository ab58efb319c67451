//! Observable session state and its persisted cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::UserInfo;
use store::{ListenerHandle, Listeners};

use crate::storage::ClientStorage;

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<UserInfo>,
    /// True until the identity provider reports for the first time.
    pub loading: bool,
    /// Last persisted session. A rendering hint only, never authoritative.
    pub cached_user: Option<UserInfo>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            cached_user: None,
        }
    }
}

/// Shared, observable [`AuthState`]. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    state: Arc<Mutex<AuthState>>,
    listeners: Listeners<AuthState>,
}

impl SessionState {
    pub fn new(initial: AuthState) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            listeners: Listeners::new(),
        }
    }

    pub fn current(&self) -> AuthState {
        self.lock().clone()
    }

    /// Register `callback` for every subsequent change.
    pub fn on_change(&self, callback: impl Fn(&AuthState) + Send + Sync + 'static) -> ListenerHandle {
        self.listeners.add(callback)
    }

    /// Record the provider's view of the session.
    pub fn resolve(&self, user: Option<UserInfo>) {
        self.modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    fn modify(&self, apply: impl FnOnce(&mut AuthState)) {
        let next = {
            let mut state = self.lock();
            let before = state.clone();
            apply(&mut state);
            if *state == before {
                return;
            }
            state.clone()
        };
        self.listeners.emit(&next);
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serialized [`UserInfo`] kept in client storage under `user`.
#[derive(Clone)]
pub struct SessionCache {
    storage: Arc<dyn ClientStorage>,
}

impl SessionCache {
    pub const KEY: &'static str = "user";

    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Read the cached session. A corrupt entry is removed.
    pub fn load(&self) -> Option<UserInfo> {
        let raw = self.storage.get(Self::KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse cached user");
                self.storage.remove(Self::KEY);
                None
            }
        }
    }

    pub fn store(&self, user: Option<&UserInfo>) {
        let Some(user) = user else {
            self.storage.remove(Self::KEY);
            return;
        };
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.set(Self::KEY, &raw),
            Err(e) => tracing::error!(error = %e, "failed to cache user"),
        }
    }
}
