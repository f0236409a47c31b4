use chrono::{DateTime, Utc};

use super::state::AuthState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    pub require_superuser: bool,
    /// Where an unauthenticated visitor is sent, usually the login page.
    pub redirect_to: String,
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self { require_superuser: false, redirect_to: "/login".into() }
    }
}

impl GuardOptions {
    pub fn superuser_only(mut self) -> Self {
        self.require_superuser = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    Redirect(String),
    ShowUnauthorized,
    ShowInactiveAccount,
    ShowChildren,
}

/// Pure, ordered decision table for protected routes. Holds no state; the
/// caller re-evaluates whenever session or options change.
pub struct RouteGuard;

impl RouteGuard {
    pub fn decide(session: &AuthState, options: &GuardOptions) -> GuardDecision {
        Self::decide_at(session, options, Utc::now())
    }

    /// `now` is injected so expiry handling stays deterministic under test.
    pub fn decide_at(session: &AuthState, options: &GuardOptions, now: DateTime<Utc>) -> GuardDecision {
        if session.is_loading {
            return GuardDecision::ShowLoading;
        }
        if !session.is_authenticated {
            return GuardDecision::Redirect(options.redirect_to.clone());
        }
        let Some(user) = session.user.as_ref() else {
            // Unreachable through AuthState constructors; fail closed anyway.
            return GuardDecision::Redirect(options.redirect_to.clone());
        };
        // An expired identity is as good as no identity; the bearer behind it
        // would be rejected on the next call either way.
        if user.is_expired(now) {
            return GuardDecision::Redirect(options.redirect_to.clone());
        }
        if options.require_superuser && !user.is_superuser {
            return GuardDecision::ShowUnauthorized;
        }
        if !user.is_active {
            return GuardDecision::ShowInactiveAccount;
        }
        GuardDecision::ShowChildren
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::identity::UserIdentity;
    use chrono::Duration;

    fn user(is_superuser: bool, is_active: bool) -> UserIdentity {
        UserIdentity {
            subject: "merchant@boost.pay".into(),
            establishments: vec![],
            is_superuser,
            is_active,
            expiry: None,
        }
    }

    #[test]
    fn loading_suppresses_everything() {
        let d = RouteGuard::decide(&AuthState::booting(), &GuardOptions::default().superuser_only());
        assert_eq!(d, GuardDecision::ShowLoading);
    }

    #[test]
    fn unauthenticated_redirects() {
        let session = AuthState::unauthenticated(Some("credential_rejected: nope".into()));
        let d = RouteGuard::decide(&session, &GuardOptions::default());
        assert_eq!(d, GuardDecision::Redirect("/login".into()));
    }

    #[test]
    fn superuser_gate() {
        let session = AuthState::authenticated(user(false, true));
        let d = RouteGuard::decide(&session, &GuardOptions::default().superuser_only());
        assert_eq!(d, GuardDecision::ShowUnauthorized);

        let session = AuthState::authenticated(user(true, true));
        let d = RouteGuard::decide(&session, &GuardOptions::default().superuser_only());
        assert_eq!(d, GuardDecision::ShowChildren);
    }

    #[test]
    fn inactive_account_wins_even_for_superuser_routes() {
        let session = AuthState::authenticated(user(true, false));
        let d = RouteGuard::decide(&session, &GuardOptions::default().superuser_only());
        assert_eq!(d, GuardDecision::ShowInactiveAccount);

        let d = RouteGuard::decide(&session, &GuardOptions::default());
        assert_eq!(d, GuardDecision::ShowInactiveAccount);
    }

    #[test]
    fn happy_path_renders_children() {
        let session = AuthState::authenticated(user(false, true));
        let d = RouteGuard::decide(&session, &GuardOptions::default());
        assert_eq!(d, GuardDecision::ShowChildren);
    }

    #[test]
    fn decide_is_idempotent() {
        let session = AuthState::authenticated(user(false, true));
        let opts = GuardOptions::default();
        let now = Utc::now();
        let a = RouteGuard::decide_at(&session, &opts, now);
        let b = RouteGuard::decide_at(&session, &opts, now);
        assert_eq!(a, b);
    }

    #[test]
    fn expired_identity_redirects() {
        let mut u = user(false, true);
        let now = Utc::now();
        u.expiry = Some(now - Duration::minutes(5));
        let session = AuthState::authenticated(u);
        let d = RouteGuard::decide_at(&session, &GuardOptions::default(), now);
        assert_eq!(d, GuardDecision::Redirect("/login".into()));
    }
}
