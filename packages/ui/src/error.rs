use api::AuthError;
use store::StoreError;
use thiserror::Error;

/// Input rejected before anything reaches the store or the provider.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingField(&'static str),
    #[error("No changes to save")]
    Unchanged,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),
}

/// Failure of a note mutation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("You must be signed in to change notes")]
    NotSignedIn,
    #[error("Note not found")]
    NotFound(String),
    #[error("Nothing is being edited")]
    NotEditing,
}

/// Failure of a submitted auth form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
