//! Client-side state for the notes app: the session, route guarding, the
//! note list and the note editor. Nothing here draws; views bind to these
//! types.

pub mod auth;
pub mod editor;
pub mod error;
pub mod guard;
pub mod notes;
pub mod notifications;
pub mod session;
pub mod storage;

pub use auth::{AuthProvider, SignupForm};
pub use editor::{EditSession, NoteFields};
pub use error::{FormError, NoteError, ValidationError};
pub use guard::{GuardOutcome, NavSignals, Requirements, RouteGuard};
pub use notes::{NoteView, NotesViewModel, SortKey};
pub use notifications::{Level, Notification, Notifications};
pub use session::{AuthState, SessionCache, SessionState};
pub use storage::{ClientStorage, MemoryStorage};
