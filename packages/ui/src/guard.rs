//! # Route guard
//!
//! Decides what a guarded view shows for the current [`AuthState`]:
//!
//! | state                                    | outcome                          |
//! |------------------------------------------|----------------------------------|
//! | session loading                          | [`GuardOutcome::Pending`]        |
//! | no session                               | redirect to the login page       |
//! | session, email unverified (if required)  | redirect to the verify page      |
//! | session, not an admin (if required)      | redirect to the unauthorized page|
//! | otherwise                                | [`GuardOutcome::Render`]         |
//!
//! When access is denied for lack of a session, the attempted path is kept in
//! the tab-scoped [`NavSignals`] so [`RouteGuard::redirect_after_login`] can
//! return there, and a one-time "sign in" notice is shown. Both are skipped on
//! the public auth pages and while a logout is in flight.

use std::sync::Arc;

use store::{AppConfig, Clock, RouteConfig};

use crate::notifications::{Level, Notifications};
use crate::session::AuthState;
use crate::storage::ClientStorage;

/// Dedupe id of the sign-in notice.
pub const AUTH_REQUIRED_ID: &str = "auth-required";
const AUTH_REQUIRED_MESSAGE: &str = "Please sign in to access this page";

/// Cross-navigation signals kept in tab-scoped storage.
#[derive(Clone)]
pub struct NavSignals {
    storage: Arc<dyn ClientStorage>,
    clock: Arc<dyn Clock>,
    logout_ttl_ms: i64,
}

impl NavSignals {
    pub const REDIRECT_KEY: &'static str = "redirectAfterLogin";
    pub const LOGOUT_KEY: &'static str = "isLoggingOut";

    pub fn new(storage: Arc<dyn ClientStorage>, clock: Arc<dyn Clock>, logout_ttl_ms: i64) -> Self {
        Self {
            storage,
            clock,
            logout_ttl_ms,
        }
    }

    pub fn set_redirect(&self, path: &str) {
        self.storage.set(Self::REDIRECT_KEY, path);
    }

    pub fn redirect(&self) -> Option<String> {
        self.storage.get(Self::REDIRECT_KEY)
    }

    pub fn take_redirect(&self) -> Option<String> {
        let target = self.redirect()?;
        self.storage.remove(Self::REDIRECT_KEY);
        Some(target)
    }

    /// Mark a logout as started. It counts as in flight for the configured TTL.
    pub fn begin_logout(&self) {
        self.storage
            .set(Self::LOGOUT_KEY, &self.clock.now_ms().to_string());
    }

    pub fn end_logout(&self) {
        self.storage.remove(Self::LOGOUT_KEY);
    }

    pub fn logout_in_flight(&self) -> bool {
        let Some(raw) = self.storage.get(Self::LOGOUT_KEY) else {
            return false;
        };
        let live = raw
            .parse::<i64>()
            .map(|started| self.clock.now_ms() - started < self.logout_ttl_ms)
            .unwrap_or(false);
        if !live {
            self.end_logout();
        }
        live
    }
}

/// Extra conditions a guarded view may impose on the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Requirements {
    pub email_verified: bool,
    pub admin: bool,
}

impl Requirements {
    pub fn verified() -> Self {
        Self {
            email_verified: true,
            admin: false,
        }
    }

    pub fn admin() -> Self {
        Self {
            email_verified: false,
            admin: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Pending,
    Render,
    Redirect(String),
}

pub struct RouteGuard {
    routes: RouteConfig,
    admin_emails: Vec<String>,
    signals: NavSignals,
    notifications: Notifications,
}

impl RouteGuard {
    pub fn new(config: &AppConfig, signals: NavSignals, notifications: Notifications) -> Self {
        Self {
            routes: config.routes.clone(),
            admin_emails: config.auth.admin_emails.clone(),
            signals,
            notifications,
        }
    }

    pub fn signals(&self) -> &NavSignals {
        &self.signals
    }

    pub fn evaluate(&self, auth: &AuthState, path: &str, requirements: Requirements) -> GuardOutcome {
        if auth.loading {
            return GuardOutcome::Pending;
        }

        let Some(user) = &auth.user else {
            self.deny(path);
            return GuardOutcome::Redirect(self.routes.login.clone());
        };

        if requirements.email_verified && !user.email_verified {
            tracing::debug!(path, "email not verified");
            return GuardOutcome::Redirect(self.routes.verify_email.clone());
        }
        if requirements.admin && !self.is_admin(&user.email) {
            tracing::warn!(path, id = %user.id, "admin route refused");
            return GuardOutcome::Redirect(self.routes.unauthorized.clone());
        }
        GuardOutcome::Render
    }

    fn deny(&self, path: &str) {
        if self.routes.is_public(path) || self.signals.logout_in_flight() {
            return;
        }
        if path != "/" {
            self.signals.set_redirect(path);
        }
        self.notifications
            .push_once(AUTH_REQUIRED_ID, Level::Error, AUTH_REQUIRED_MESSAGE);
        tracing::debug!(path, "sign-in required");
    }

    fn is_admin(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email))
    }

    /// Where to go once signed in: the stored target (consumed) or the
    /// default page. `None` without a session or when already there.
    pub fn redirect_after_login(&self, auth: &AuthState, current_path: &str) -> Option<String> {
        auth.user.as_ref()?;
        let target = self
            .signals
            .take_redirect()
            .unwrap_or_else(|| self.routes.after_login.clone());
        (target != current_path).then_some(target)
    }
}
