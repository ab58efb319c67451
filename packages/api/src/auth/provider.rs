//! # Identity provider contract
//!
//! The hosted authentication service is an external collaborator. This trait
//! is the whole surface the application relies on. Identities come back as
//! [`UserInfo`] value snapshots; failures as [`ProviderError`] with an
//! enumerable code.
//!
//! | Method | Effect |
//! |--------|--------|
//! | [`create_identity`](IdentityProvider::create_identity) | Register an email/password identity. Does not sign it in. |
//! | [`authenticate`](IdentityProvider::authenticate) | Email/password sign-in; establishes the session. |
//! | [`authenticate_federated`](IdentityProvider::authenticate_federated) | Google sign-in; creates the identity on first use and establishes the session. |
//! | [`current_session`](IdentityProvider::current_session) | The signed-in identity, if any. |
//! | [`on_session_change`](IdentityProvider::on_session_change) | Called with the current session right away, then on every sign-in and sign-out. |
//! | [`update_profile`](IdentityProvider::update_profile) | Change display name and/or photo. |
//! | [`delete_identity`](IdentityProvider::delete_identity) | Remove an identity, ending its session if active. |
//! | [`end_session`](IdentityProvider::end_session) | Sign out. |

use store::ListenerHandle;

use crate::error::ProviderError;
use crate::models::{ProfileUpdate, UserInfo};

pub trait IdentityProvider {
    fn create_identity(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserInfo, ProviderError>>;

    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<UserInfo, ProviderError>>;

    fn authenticate_federated(
        &self,
    ) -> impl std::future::Future<Output = Result<UserInfo, ProviderError>>;

    fn current_session(&self) -> Option<UserInfo>;

    fn on_session_change(
        &self,
        callback: impl Fn(Option<&UserInfo>) + Send + Sync + 'static,
    ) -> ListenerHandle;

    fn update_profile(
        &self,
        identity_id: &str,
        update: &ProfileUpdate,
    ) -> impl std::future::Future<Output = Result<UserInfo, ProviderError>>;

    fn delete_identity(
        &self,
        identity_id: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>>;

    fn end_session(&self) -> impl std::future::Future<Output = Result<(), ProviderError>>;
}
