use std::sync::Arc;

use api::auth::{FederatedAccount, IdentityProvider, MemoryIdentityProvider, ProviderOp};
use api::{AuthCoordinator, AuthError, AuthErrorCode, Profile};
use store::{AppConfig, ManualClock, MemoryStore, Store};

const START: i64 = 1_700_000_000_000;

struct Harness {
    provider: Arc<MemoryIdentityProvider>,
    store: Arc<MemoryStore>,
    clock: ManualClock,
    coordinator: AuthCoordinator<MemoryIdentityProvider, MemoryStore>,
}

fn harness() -> Harness {
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(START);
    let coordinator = AuthCoordinator::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        Arc::new(clock.clone()),
        &AppConfig::default(),
    );
    Harness {
        provider,
        store,
        clock,
        coordinator,
    }
}

fn account(name: Option<&str>, photo: Option<&str>) -> FederatedAccount {
    FederatedAccount {
        email: "grace@example.com".into(),
        display_name: name.map(str::to_string),
        photo_url: photo.map(str::to_string),
    }
}

async fn profile(h: &Harness, id: &str) -> Option<Profile> {
    h.store
        .read(&format!("profiles/{id}"))
        .await
        .unwrap()
        .deserialize()
        .unwrap()
}

#[tokio::test]
async fn test_first_login_creates_profile() {
    let h = harness();
    h.provider.queue_federated(account(Some("Grace"), Some("g.png")));

    let user = h.coordinator.login_with_google().await.unwrap();

    let stored = profile(&h, &user.id).await.unwrap();
    assert_eq!(stored.display_name, "Grace");
    assert_eq!(stored.photo_url, "g.png");
    assert_eq!(stored.created_at, START);
    assert_eq!(stored.last_login, START);
    assert!(h.provider.calls().contains(&ProviderOp::UpdateProfile));
}

#[tokio::test]
async fn test_first_login_without_name_skips_identity_update() {
    let h = harness();
    h.provider.queue_federated(account(None, None));

    let user = h.coordinator.login_with_google().await.unwrap();

    assert_eq!(profile(&h, &user.id).await.unwrap().display_name, "grace");
    assert!(!h.provider.calls().contains(&ProviderOp::UpdateProfile));
}

#[tokio::test]
async fn test_returning_login_merges_profile() {
    let h = harness();
    h.provider.queue_federated(account(Some("Grace"), Some("old.png")));
    let user = h.coordinator.login_with_google().await.unwrap();
    h.coordinator.logout().await.unwrap();

    h.clock.advance(60_000);
    h.provider.queue_federated(account(Some("Grace Hopper"), None));
    let again = h.coordinator.login_with_google().await.unwrap();
    assert_eq!(again.id, user.id);

    let stored = profile(&h, &user.id).await.unwrap();
    assert_eq!(stored.photo_url, "old.png");
    assert_eq!(stored.display_name, "Grace Hopper");
    assert_eq!(stored.created_at, START);
    assert_eq!(stored.last_login, START + 60_000);
}

#[tokio::test]
async fn test_blank_provider_name_is_not_propagated() {
    let h = harness();
    h.provider.queue_federated(account(Some(""), None));

    let user = h.coordinator.login_with_google().await.unwrap();

    assert_eq!(profile(&h, &user.id).await.unwrap().display_name, "grace");
    assert!(!h.provider.calls().contains(&ProviderOp::UpdateProfile));
    assert_eq!(h.provider.identity(&user.id).unwrap().display_name.as_deref(), Some(""));
}

#[tokio::test]
async fn test_returning_login_with_blank_photo_keeps_stored_photo() {
    let h = harness();
    h.provider.queue_federated(account(Some("Grace"), Some("old.png")));
    let user = h.coordinator.login_with_google().await.unwrap();
    h.coordinator.logout().await.unwrap();

    h.clock.advance(1_000);
    h.provider.queue_federated(account(Some(""), Some("")));
    h.coordinator.login_with_google().await.unwrap();

    let stored = profile(&h, &user.id).await.unwrap();
    assert_eq!(stored.photo_url, "old.png");
    assert_eq!(stored.display_name, "Grace");
    assert_eq!(stored.last_login, START + 1_000);
}

#[tokio::test]
async fn test_profile_failure_for_new_user_signs_out_and_deletes_identity() {
    let h = harness();
    h.store.fail_writes_under("profiles");
    h.provider.queue_federated(account(Some("Grace"), None));

    let err = h.coordinator.login_with_google().await.unwrap_err();

    assert_eq!(err, AuthError::SignInIncomplete);
    assert!(h.provider.current_session().is_none());
    assert_eq!(h.provider.identity_count(), 0);
    assert!(h.provider.calls().contains(&ProviderOp::EndSession));
}

#[tokio::test]
async fn test_profile_failure_for_returning_user_keeps_identity() {
    let h = harness();
    h.provider.queue_federated(account(Some("Grace"), None));
    let user = h.coordinator.login_with_google().await.unwrap();
    h.coordinator.logout().await.unwrap();

    h.store.fail_writes_under("profiles");
    h.provider.queue_federated(account(Some("Grace"), None));
    let err = h.coordinator.login_with_google().await.unwrap_err();

    assert_eq!(err, AuthError::SignInIncomplete);
    assert!(h.provider.current_session().is_none());
    assert!(h.provider.identity(&user.id).is_some());
}

#[tokio::test]
async fn test_popup_errors_are_mapped() {
    let h = harness();

    // Nothing queued: the user closed the popup.
    assert_eq!(
        h.coordinator.login_with_google().await,
        Err(AuthError::PopupCancelled)
    );

    h.provider
        .fail_next(ProviderOp::AuthenticateFederated, AuthErrorCode::PopupBlocked);
    assert_eq!(
        h.coordinator.login_with_google().await,
        Err(AuthError::PopupBlocked)
    );

    h.provider.fail_next(
        ProviderOp::AuthenticateFederated,
        AuthErrorCode::NetworkRequestFailed,
    );
    assert_eq!(
        h.coordinator.login_with_google().await,
        Err(AuthError::NetworkFailure)
    );
}

#[tokio::test]
async fn test_password_account_conflict() {
    let h = harness();
    h.coordinator.signup("grace@example.com", "secret1").await.unwrap();
    h.coordinator.logout().await.unwrap();

    h.provider.queue_federated(account(Some("Grace"), None));
    assert_eq!(
        h.coordinator.login_with_google().await,
        Err(AuthError::CredentialConflict)
    );
}
