//! # Note list view-model
//!
//! [`NotesViewModel`] subscribes to the notes collection for the signed-in
//! identity and keeps a filtered, sorted list. Mutations go straight to the
//! store; their effect shows up through the next snapshot, never through
//! local patching.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::UserInfo;
use store::tree::child_path;
use store::{AppConfig, Clock, ListenerHandle, Note, NotePatch, Snapshot, Store, StoreError, Subscription};

use crate::editor::NoteFields;
use crate::error::{NoteError, ValidationError};
use crate::notifications::Notifications;
use crate::session::SessionState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Longest,
    Shortest,
}

impl SortKey {
    /// Unknown keys fall back to [`SortKey::Newest`].
    pub fn parse(key: &str) -> Self {
        match key {
            "oldest" => Self::Oldest,
            "longest" => Self::Longest,
            "shortest" => Self::Shortest,
            _ => Self::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Longest => "longest",
            Self::Shortest => "shortest",
        }
    }

    fn compare(&self, a: &NoteView, b: &NoteView) -> Ordering {
        let primary = match self {
            Self::Newest => b.note.updated_at.cmp(&a.note.updated_at),
            Self::Oldest => a.note.updated_at.cmp(&b.note.updated_at),
            Self::Longest => b.content_length.cmp(&a.content_length),
            Self::Shortest => a.content_length.cmp(&b.content_length),
        };
        primary.then_with(|| a.note.id.cmp(&b.note.id))
    }
}

/// A listed note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteView {
    pub note: Note,
    /// Characters in the content.
    pub content_length: usize,
}

impl NoteView {
    fn new(note: Note) -> Self {
        let content_length = note.content.chars().count();
        Self {
            note,
            content_length,
        }
    }
}

/// Flatten a collection snapshot into every decodable note.
/// The entry key wins over any `id` stored in the record.
pub fn flatten(snapshot: &Snapshot) -> Vec<NoteView> {
    snapshot
        .children()
        .filter_map(|(key, value)| match serde_json::from_value::<Note>(value.clone()) {
            Ok(mut note) => {
                note.id = key.to_string();
                Some(NoteView::new(note))
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "skipping malformed note");
                None
            }
        })
        .collect()
}

/// The notes owned by `owner`, ordered by `sort`.
pub fn project(all: &[NoteView], owner: &str, sort: SortKey) -> Vec<NoteView> {
    let mut notes: Vec<NoteView> = all
        .iter()
        .filter(|n| n.note.user_id == owner)
        .cloned()
        .collect();
    notes.sort_by(|a, b| sort.compare(a, b));
    notes
}

#[derive(Debug, Default)]
struct ListState {
    owner: Option<String>,
    sort: SortKey,
    all: Vec<NoteView>,
    notes: Vec<NoteView>,
    loading: bool,
}

impl ListState {
    fn refresh(&mut self) {
        self.notes = match &self.owner {
            Some(owner) => project(&self.all, owner, self.sort),
            None => Vec::new(),
        };
    }
}

pub struct NotesViewModel<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    notes_path: String,
    notifications: Notifications,
    state: Arc<Mutex<ListState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<S: Store> NotesViewModel<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: &AppConfig, notifications: Notifications) -> Self {
        Self {
            store,
            clock,
            notes_path: config.store.notes_path.clone(),
            notifications,
            state: Arc::default(),
            subscription: Mutex::new(None),
        }
    }

    /// Follow `user`: subscribe for a new identity, tear down for none.
    /// Re-attaching the same identity keeps the live subscription.
    pub fn attach(&self, user: Option<&UserInfo>) {
        let owner = user.map(|u| u.id.clone());
        {
            let mut state = self.state();
            if state.owner == owner && self.subscription_slot().is_some() {
                return;
            }
            state.owner = owner.clone();
            state.all.clear();
            state.notes.clear();
            state.loading = owner.is_some();
        }

        // Drop the old subscription before opening the next one.
        self.subscription_slot().take();
        if owner.is_none() {
            return;
        }

        let on_snapshot = {
            let state = Arc::clone(&self.state);
            move |snapshot: &Snapshot| {
                let all = flatten(snapshot);
                let mut state = lock(&state);
                state.all = all;
                state.loading = false;
                state.refresh();
            }
        };
        let on_error = {
            let state = Arc::clone(&self.state);
            let notifications = self.notifications.clone();
            move |e: &StoreError| {
                tracing::error!(error = %e, "notes subscription failed");
                lock(&state).loading = false;
                notifications.error("Failed to load notes");
            }
        };
        let subscription = self.store.subscribe(&self.notes_path, on_snapshot, on_error);
        *self.subscription_slot() = Some(subscription);
    }

    /// Re-attach whenever the session's identity changes.
    pub fn follow(self: &Arc<Self>, session: &SessionState) -> ListenerHandle
    where
        S: Send + Sync + 'static,
    {
        self.attach(session.current().user.as_ref());
        let vm = Arc::downgrade(self);
        session.on_change(move |auth| {
            if let Some(vm) = vm.upgrade() {
                vm.attach(auth.user.as_ref());
            }
        })
    }

    pub fn detach(&self) {
        self.attach(None);
    }

    pub fn set_sort(&self, sort: SortKey) {
        let mut state = self.state();
        state.sort = sort;
        state.refresh();
    }

    pub fn sort(&self) -> SortKey {
        self.state().sort
    }

    pub fn notes(&self) -> Vec<NoteView> {
        self.state().notes.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    fn owner(&self) -> Result<String, NoteError> {
        self.state().owner.clone().ok_or(NoteError::NotSignedIn)
    }

    /// Mutations only target notes the signed-in identity currently sees.
    fn ensure_listed(&self, id: &str) -> Result<(), NoteError> {
        let state = self.state();
        if state.owner.is_none() {
            return Err(NoteError::NotSignedIn);
        }
        if !state.notes.iter().any(|n| n.note.id == id) {
            return Err(NoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Create a note. Both fields must be non-blank. Returns the new id.
    pub async fn create(&self, title: &str, content: &str) -> Result<String, NoteError> {
        NoteFields::new(title, content).validate()?;
        let owner = self.owner()?;

        match self.insert(owner, title, content).await {
            Ok(id) => {
                tracing::info!(%id, "note created");
                self.notifications.success("Note created successfully!");
                Ok(id)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to create note");
                self.notifications.error("Failed to create note");
                Err(e.into())
            }
        }
    }

    async fn insert(&self, owner: String, title: &str, content: &str) -> Result<String, StoreError> {
        let id = self.store.append(&self.notes_path).await?;
        let note = Note::new(id.clone(), owner, title, content, self.clock.now_ms());
        let path = child_path(&self.notes_path, &id);
        let value = serde_json::to_value(&note).map_err(|e| StoreError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.store.write(&path, value).await?;
        Ok(id)
    }

    /// Save an edit. Refused when `draft` equals `original` or is invalid.
    pub async fn update(&self, id: &str, original: &NoteFields, draft: &NoteFields) -> Result<(), NoteError> {
        if draft == original {
            return Err(ValidationError::Unchanged.into());
        }
        draft.validate()?;
        self.ensure_listed(id)?;

        let patch = NotePatch::new(&draft.title, &draft.content, self.clock.now_ms());
        let path = child_path(&self.notes_path, id);
        match self.store.update(&path, patch.into_fields()).await {
            Ok(()) => {
                tracing::info!(id, "note updated");
                self.notifications.success("Note updated successfully!");
                Ok(())
            }
            Err(e) => {
                tracing::error!(id, error = %e, "failed to update note");
                self.notifications.error("Failed to update note");
                Err(e.into())
            }
        }
    }

    /// Delete a note once `confirm` agrees. Returns whether it was deleted.
    pub async fn delete(&self, id: &str, confirm: impl FnOnce() -> bool) -> Result<bool, NoteError> {
        self.ensure_listed(id)?;
        if !confirm() {
            return Ok(false);
        }

        let path = child_path(&self.notes_path, id);
        match self.store.delete(&path).await {
            Ok(()) => {
                tracing::info!(id, "note deleted");
                self.notifications.success("Note deleted successfully!");
                Ok(true)
            }
            Err(e) => {
                tracing::error!(id, error = %e, "failed to delete note");
                self.notifications.error("Failed to delete note");
                Err(e.into())
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ListState> {
        lock(&self.state)
    }

    fn subscription_slot(&self) -> MutexGuard<'_, Option<Subscription>> {
        lock(&self.subscription)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
