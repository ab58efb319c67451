use std::sync::Arc;

use api::auth::{IdentityProvider, MemoryIdentityProvider};
use api::{AuthCoordinator, AuthError};
use store::{AppConfig, ManualClock, MemoryStore};
use ui::{
    AuthProvider, ClientStorage, FormError, GuardOutcome, MemoryStorage, NavSignals,
    NotesViewModel, Notifications, Requirements, RouteGuard, SessionCache, SignupForm,
    ValidationError,
};

struct App {
    provider: Arc<MemoryIdentityProvider>,
    local: Arc<MemoryStorage>,
    tab: Arc<MemoryStorage>,
    clock: ManualClock,
    notifications: Notifications,
    auth: AuthProvider<MemoryIdentityProvider, MemoryStore>,
    guard: RouteGuard,
    notes: Arc<NotesViewModel<MemoryStore>>,
}

fn app_with_cache(local: Arc<MemoryStorage>) -> App {
    let config = AppConfig::default();
    let clock = ManualClock::new(50_000);
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = Arc::new(MemoryStore::new());
    let tab = Arc::new(MemoryStorage::new());
    let notifications = Notifications::new(Arc::new(clock.clone()), config.notifications.display_ms);
    let signals = NavSignals::new(
        tab.clone(),
        Arc::new(clock.clone()),
        config.routes.logout_signal_ttl_ms,
    );

    let coordinator = AuthCoordinator::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        Arc::new(clock.clone()),
        &config,
    );
    let auth = AuthProvider::new(
        coordinator,
        SessionCache::new(local.clone()),
        signals.clone(),
        notifications.clone(),
        config.auth.min_password_length,
    );
    let guard = RouteGuard::new(&config, signals, notifications.clone());
    let notes = Arc::new(NotesViewModel::new(
        store,
        Arc::new(clock.clone()),
        &config,
        notifications.clone(),
    ));

    App {
        provider,
        local,
        tab,
        clock,
        notifications,
        auth,
        guard,
        notes,
    }
}

fn app() -> App {
    app_with_cache(Arc::new(MemoryStorage::new()))
}

fn signup_form(email: &str) -> SignupForm {
    SignupForm {
        email: email.into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
    }
}

#[tokio::test]
async fn test_guarded_visit_then_signup_returns_to_page() {
    let app = app();
    let _follow = app.notes.follow(app.auth.session());
    assert!(!app.auth.state().loading);

    let outcome = app.guard.evaluate(&app.auth.state(), "/notes", Requirements::default());
    assert_eq!(outcome, GuardOutcome::Redirect("/login".into()));
    assert_eq!(app.tab.get(NavSignals::REDIRECT_KEY).as_deref(), Some("/notes"));

    let user = app.auth.submit_signup(&signup_form("ada@example.com")).await.unwrap();
    let state = app.auth.state();
    assert_eq!(state.user.as_ref().map(|u| u.id.as_str()), Some(user.id.as_str()));
    assert!(app.local.get(SessionCache::KEY).is_some());

    assert_eq!(app.guard.redirect_after_login(&state, "/signup"), Some("/notes".into()));
    assert_eq!(
        app.guard.evaluate(&state, "/notes", Requirements::default()),
        GuardOutcome::Render
    );

    app.notes.create("Hello", "world").await.unwrap();
    assert_eq!(app.notes.notes().len(), 1);
    assert!(app
        .notifications
        .messages()
        .contains(&"Account created successfully!".to_string()));
}

#[tokio::test]
async fn test_signup_form_errors_stay_local() {
    let app = app();
    let mut form = signup_form("ada@example.com");
    form.confirm_password = "secret2".into();

    assert_eq!(
        app.auth.submit_signup(&form).await,
        Err(FormError::Validation(ValidationError::PasswordMismatch))
    );
    assert!(app.provider.calls().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_and_stays_quiet() {
    let app = app();
    let _follow = app.notes.follow(app.auth.session());
    app.auth.submit_signup(&signup_form("ada@example.com")).await.unwrap();
    app.notes.create("Hello", "world").await.unwrap();
    app.notifications.clear();

    app.auth.logout().await.unwrap();

    let state = app.auth.state();
    assert!(state.user.is_none());
    assert_eq!(app.local.get(SessionCache::KEY), None);
    assert!(app.notes.notes().is_empty());

    // The page re-renders right after logout: no notice, no stored target.
    app.guard.evaluate(&state, "/notes", Requirements::default());
    assert_eq!(app.notifications.messages(), vec!["Logged out successfully"]);
    assert_eq!(app.tab.get(NavSignals::REDIRECT_KEY), None);

    app.clock.advance(2_000);
    app.guard.evaluate(&state, "/notes", Requirements::default());
    assert_eq!(app.notifications.entries().len(), 2);
}

#[tokio::test]
async fn test_cached_user_is_only_a_hint() {
    let local = Arc::new(MemoryStorage::new());
    {
        let first = app_with_cache(local.clone());
        first.auth.submit_signup(&signup_form("ada@example.com")).await.unwrap();
    }
    assert!(local.get(SessionCache::KEY).is_some());

    // A fresh process: the cache is read but the provider has no session.
    let app = app_with_cache(local.clone());
    let state = app.auth.state();
    assert_eq!(
        state.cached_user.as_ref().map(|u| u.email.as_str()),
        Some("ada@example.com")
    );
    assert!(state.user.is_none());
    assert!(app.provider.current_session().is_none());
    assert_eq!(local.get(SessionCache::KEY), None);
    assert_eq!(
        app.guard.evaluate(&state, "/notes", Requirements::default()),
        GuardOutcome::Redirect("/login".into())
    );
}

#[tokio::test]
async fn test_failed_login_is_reported() {
    let app = app();
    assert_eq!(
        app.auth.login("nobody@example.com", "secret1").await,
        Err(AuthError::InvalidCredentials)
    );
    assert_eq!(app.notifications.messages(), vec!["Invalid email or password."]);
}
