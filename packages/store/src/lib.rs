pub mod clock;
pub mod config;
pub mod error;
pub mod listeners;
pub mod models;
pub mod tree;

mod memory;
pub use memory::MemoryStore;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, AuthConfig, ConfigError, NotificationConfig, RouteConfig, StoreConfig};
pub use error::StoreError;
pub use listeners::{ListenerHandle, Listeners};
pub use models::{Note, NotePatch, DEFAULT_NOTE_TITLE};
pub use tree::{Snapshot, Store, Subscription};
