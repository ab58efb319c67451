//! `notes` demo binary.
//!
//! Wires the in-memory identity provider and tree store into the session,
//! guard and note list, then runs a scripted session:
//!
//! ```text
//! notes [newest|oldest|longest|shortest]
//! ```

use std::sync::Arc;

use anyhow::Context;
use api::auth::{GoogleOAuth, MemoryIdentityProvider};
use api::AuthCoordinator;
use store::{AppConfig, Clock, MemoryStore, SystemClock};
use tracing_subscriber::EnvFilter;
use ui::{
    AuthProvider, GuardOutcome, MemoryStorage, NavSignals, NotesViewModel, Notifications,
    Requirements, RouteGuard, SessionCache, SignupForm, SortKey,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path =
        std::env::var("NOTES_CONFIG").unwrap_or_else(|_| AppConfig::filename().to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    tracing::info!(path = %config_path, "configuration loaded");

    let sort = std::env::args()
        .nth(1)
        .map(|key| SortKey::parse(&key))
        .unwrap_or_default();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = Arc::new(MemoryIdentityProvider::new());
    let store = Arc::new(MemoryStore::new());
    let notifications = Notifications::new(Arc::clone(&clock), config.notifications.display_ms);
    let signals = NavSignals::new(
        Arc::new(MemoryStorage::new()),
        Arc::clone(&clock),
        config.routes.logout_signal_ttl_ms,
    );

    let auth = AuthProvider::new(
        AuthCoordinator::new(provider, Arc::clone(&store), Arc::clone(&clock), &config),
        SessionCache::new(Arc::new(MemoryStorage::new())),
        signals.clone(),
        notifications.clone(),
        config.auth.min_password_length,
    );
    let guard = RouteGuard::new(&config, signals, notifications.clone());
    let notes = Arc::new(NotesViewModel::new(
        store,
        Arc::clone(&clock),
        &config,
        notifications.clone(),
    ));
    let _follow = notes.follow(auth.session());

    let page = config.routes.after_login.clone();
    match guard.evaluate(&auth.state(), &page, Requirements::default()) {
        GuardOutcome::Redirect(to) => println!("{page} -> {to}"),
        other => println!("{page}: {other:?}"),
    }

    let form = SignupForm {
        email: DEMO_EMAIL.to_string(),
        password: DEMO_PASSWORD.to_string(),
        confirm_password: DEMO_PASSWORD.to_string(),
    };
    let user = auth.submit_signup(&form).await.context("signup failed")?;
    println!("signed up as {} ({})", user.display_name(), user.id);

    if let Some(to) = guard.redirect_after_login(&auth.state(), &config.routes.signup) {
        println!("{} -> {to}", config.routes.signup);
    }

    for (title, content) in [
        ("Groceries", "milk, eggs, bread"),
        ("Ideas", "write a tree store"),
        ("Todo", "ship it"),
    ] {
        notes.create(title, content).await?;
    }

    notes.set_sort(sort);
    println!("notes ({}):", sort.as_str());
    for view in notes.notes() {
        println!(
            "  {:<12} {:>4} chars  updated {}",
            view.note.title, view.content_length, view.note.updated_at
        );
    }

    match GoogleOAuth::new() {
        Ok(google) => println!("google sign-in: {}", google.authorization_request().url),
        Err(e) => tracing::debug!(error = %e, "google sign-in not configured"),
    }

    auth.logout().await?;
    for message in notifications.messages() {
        println!("* {message}");
    }
    Ok(())
}
