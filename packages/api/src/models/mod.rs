//! Data models for identities and profile records.

mod profile;
mod user;

pub use profile::Profile;
pub(crate) use profile::non_empty;
pub use user::{email_local_part, ProfileUpdate, UserInfo};
