//! Edit session for the note form.
//!
//! ```text
//! Idle -> Creating(draft)              -> saved | cancelled -> Idle
//! Idle -> Editing(id, original, draft) -> saved | cancelled -> Idle
//! ```
//!
//! Cancelling never touches the store. A failed save keeps the draft.

use store::Store;

use crate::error::{NoteError, ValidationError};
use crate::notes::{NoteView, NotesViewModel};

/// Title and content as typed in the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: String,
    pub content: String,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Both fields must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingField("content"));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Creating {
        draft: NoteFields,
    },
    Editing {
        id: String,
        original: NoteFields,
        draft: NoteFields,
    },
}

impl EditSession {
    pub fn start_create(&mut self) {
        *self = Self::Creating {
            draft: NoteFields::default(),
        };
    }

    /// Snapshot the note's current fields; the draft starts equal to them.
    pub fn start_edit(&mut self, note: &NoteView) {
        let original = NoteFields::new(note.note.title.clone(), note.note.content.clone());
        *self = Self::Editing {
            id: note.note.id.clone(),
            draft: original.clone(),
            original,
        };
    }

    pub fn draft(&self) -> Option<&NoteFields> {
        match self {
            Self::Idle => None,
            Self::Creating { draft } | Self::Editing { draft, .. } => Some(draft),
        }
    }

    fn draft_mut(&mut self) -> Option<&mut NoteFields> {
        match self {
            Self::Idle => None,
            Self::Creating { draft } | Self::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.title = title.into();
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        if let Some(draft) = self.draft_mut() {
            draft.content = content.into();
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Creating { draft } => *draft != NoteFields::default(),
            Self::Editing { original, draft, .. } => draft != original,
        }
    }

    /// Whether the save affordance is enabled.
    pub fn can_save(&self) -> bool {
        match self {
            Self::Idle => false,
            Self::Creating { draft } => draft.is_valid(),
            Self::Editing { original, draft, .. } => draft != original && draft.is_valid(),
        }
    }

    /// Discard the draft.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Push the draft through `notes` and return to idle on success.
    pub async fn save<S: Store>(&mut self, notes: &NotesViewModel<S>) -> Result<(), NoteError> {
        match self {
            Self::Idle => return Err(NoteError::NotEditing),
            Self::Creating { draft } => {
                notes.create(&draft.title, &draft.content).await?;
            }
            Self::Editing { id, original, draft } => {
                notes.update(id, original, draft).await?;
            }
        }
        *self = Self::Idle;
        Ok(())
    }
}
