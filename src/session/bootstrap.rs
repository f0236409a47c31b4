use std::sync::Arc;

use anyhow::Result;

use crate::config::{AuthConfig, TOKEN_STORAGE_KEY};
use crate::storage::SharedStore;
use crate::tprintln;

use super::establishment::EstablishmentSelector;
use super::state::{AuthState, SessionHandle};
use super::token::{TokenResolver, UrlParams};
use super::verifier::IdentityVerifier;

/// Navigation the caller should perform after a settle. The core never
/// navigates itself; a thin adapter applies this to the actual router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEffect {
    pub to: String,
    /// Originating path, kept so an adapter can bring the user back after
    /// login. Return-navigation itself is the adapter's business.
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapOutcome {
    pub state: AuthState,
    /// True when a URL-carried token was consumed; the adapter must scrub it
    /// from the address bar so it does not linger in history.
    pub stripped_url_token: bool,
    pub navigate: Option<NavigationEffect>,
}

/// Boot-time session resolution: URL token, then persisted token, then the
/// configured development fallback, each verified at most once and strictly
/// in sequence. Always settles; verification failures become state, never
/// panics. Also the home of explicit `login` / `logout`.
pub struct Bootstrapper {
    config: AuthConfig,
    store: SharedStore,
    verifier: Arc<dyn IdentityVerifier>,
    session: Arc<SessionHandle>,
    establishments: EstablishmentSelector,
}

impl Bootstrapper {
    pub fn new(
        config: AuthConfig,
        store: SharedStore,
        verifier: Arc<dyn IdentityVerifier>,
        session: Arc<SessionHandle>,
    ) -> Self {
        let establishments = EstablishmentSelector::new(store.clone());
        Self { config, store, verifier, session, establishments }
    }

    pub fn session(&self) -> &Arc<SessionHandle> { &self.session }

    pub fn establishments(&self) -> &EstablishmentSelector { &self.establishments }

    /// Run the boot sequence once. Consumes (and strips) a URL-carried token
    /// if present. Any unexpected internal error is caught here and settles
    /// the session unauthenticated rather than leaving it loading forever.
    pub async fn bootstrap(&self, params: &mut UrlParams, current_path: &str) -> BootstrapOutcome {
        let request_id = self.session.begin_request();
        match self.run(params, current_path, request_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "session bootstrap failed unexpectedly");
                let state = AuthState::unauthenticated(Some("initialization failed".into()));
                self.settle(request_id, state, None, false)
            }
        }
    }

    async fn run(
        &self,
        params: &mut UrlParams,
        current_path: &str,
        request_id: u64,
    ) -> Result<BootstrapOutcome> {
        // Tier 1: credential handed off via the URL. Single-use; stripped
        // before anything can re-read it.
        if let Some(token) = TokenResolver::from_url(params) {
            params.strip("token");
            tprintln!("bootstrap.tier=url path={}", current_path);
            return Ok(match self.verify_state(&token).await {
                state if state.is_authenticated => {
                    let nav = self.home_redirect_if_on_login(current_path);
                    self.settle_authenticated(request_id, state, nav, true, Some(&token))
                }
                state => {
                    let nav = self.login_redirect_unless_public(current_path);
                    self.settle(request_id, state, nav, true)
                }
            });
        }

        // Tier 2: persisted token. A failure here is not terminal; the
        // fallback tier still gets its turn.
        let mut last_error: Option<String> = None;
        if let Some(token) = TokenResolver::from_storage(self.store.as_ref()) {
            tprintln!("bootstrap.tier=storage path={}", current_path);
            match self.verifier.verify(&token).await {
                Ok(user) => {
                    let state = AuthState::authenticated(user);
                    let nav = self.home_redirect_if_on_login(current_path);
                    return Ok(self.settle_authenticated(request_id, state, nav, false, None));
                }
                Err(e) => {
                    // Only a real rejection invalidates the stored value; a
                    // transient network failure must not wipe a good token.
                    // Compare-and-remove: a login that raced ahead of this
                    // verification may have persisted a fresh credential
                    // under the same key, which must survive.
                    if matches!(e, crate::error::AuthError::Rejected { .. })
                        && self.store.get(TOKEN_STORAGE_KEY).as_deref() == Some(token.as_str())
                    {
                        if let Err(e) = self.store.remove(TOKEN_STORAGE_KEY) {
                            tracing::warn!(error = %e, "failed to drop rejected stored token");
                        }
                    }
                    tracing::warn!(code = e.code_str(), "stored token verification failed");
                    last_error = Some(e.reason());
                }
            }
        }

        // Tier 3: compiled-in development fallback, when configured.
        if let Some(token) = TokenResolver::from_fallback(&self.config) {
            tprintln!("bootstrap.tier=fallback path={}", current_path);
            return Ok(match self.verify_state(&token).await {
                state if state.is_authenticated => {
                    let nav = self.home_redirect_if_on_login(current_path);
                    self.settle_authenticated(request_id, state, nav, false, None)
                }
                state => {
                    let nav = self.login_redirect_unless_public(current_path);
                    self.settle(request_id, state, nav, false)
                }
            });
        }

        // Tier 4: no credential left to try. Carries the storage-tier failure
        // reason when that is why we ended up here.
        tprintln!("bootstrap.tier=none path={}", current_path);
        let nav = self.login_redirect_unless_public(current_path);
        Ok(self.settle(request_id, AuthState::unauthenticated(last_error), nav, false))
    }

    /// Explicit login with a user-supplied credential, e.g. the login form.
    /// Safe to call while a bootstrap verification is still in flight: the
    /// request-id guard makes the most recent caller win.
    pub async fn login(&self, token: &str) -> AuthState {
        let request_id = self.session.begin_request();
        let state = self.verify_state(token).await;
        // Commit before any persistent side effect: a result that lost the
        // race must leave storage exactly as the winner wrote it.
        if !self.session.commit(request_id, state.clone()) {
            return self.session.snapshot();
        }
        if state.is_authenticated {
            self.persist_token(token);
            self.auto_select(&state);
        }
        state
    }

    /// Drop the persisted credential and establishment selection and settle
    /// unauthenticated. Anything still in flight becomes stale.
    pub fn logout(&self) {
        if let Err(e) = self.store.remove(TOKEN_STORAGE_KEY) {
            tracing::warn!(error = %e, "failed to drop persisted token on logout");
        }
        self.establishments.clear();
        self.session.force(AuthState::unauthenticated(None));
        tprintln!("session.logout");
    }

    /// Normalize a verification into session state. Never fails outward; the
    /// failure reason travels in `AuthState.error`.
    async fn verify_state(&self, token: &str) -> AuthState {
        match self.verifier.verify(token).await {
            Ok(user) => {
                tracing::debug!(subject = %user.subject, "identity verified");
                AuthState::authenticated(user)
            }
            Err(e) => {
                tracing::warn!(code = e.code_str(), "identity verification failed");
                AuthState::unauthenticated(Some(e.reason()))
            }
        }
    }

    fn settle(
        &self,
        request_id: u64,
        state: AuthState,
        navigate: Option<NavigationEffect>,
        stripped_url_token: bool,
    ) -> BootstrapOutcome {
        if self.session.commit(request_id, state.clone()) {
            BootstrapOutcome { state, stripped_url_token, navigate }
        } else {
            // A newer login already settled; report its state and stay put.
            BootstrapOutcome { state: self.session.snapshot(), stripped_url_token, navigate: None }
        }
    }

    /// Settle an authenticated result. Persistent side effects (token write,
    /// establishment auto-select) run only when the commit wins; a result
    /// that lost to a newer login must not touch storage.
    fn settle_authenticated(
        &self,
        request_id: u64,
        state: AuthState,
        navigate: Option<NavigationEffect>,
        stripped_url_token: bool,
        persist: Option<&str>,
    ) -> BootstrapOutcome {
        if !self.session.commit(request_id, state.clone()) {
            return BootstrapOutcome {
                state: self.session.snapshot(),
                stripped_url_token,
                navigate: None,
            };
        }
        if let Some(token) = persist {
            self.persist_token(token);
        }
        self.auto_select(&state);
        BootstrapOutcome { state, stripped_url_token, navigate }
    }

    fn persist_token(&self, token: &str) {
        // The reserved placeholder is a dead value, never a credential.
        if token == crate::config::TOKEN_PLACEHOLDER {
            return;
        }
        if let Err(e) = self.store.set(TOKEN_STORAGE_KEY, token) {
            tracing::warn!(error = %e, "failed to persist bearer token");
        }
    }

    fn auto_select(&self, state: &AuthState) {
        if let Some(user) = state.user.as_ref() {
            self.establishments.init(&user.establishments);
        }
    }

    fn home_redirect_if_on_login(&self, current_path: &str) -> Option<NavigationEffect> {
        (current_path == self.config.login_path).then(|| NavigationEffect {
            to: self.config.home_path.clone(),
            from: current_path.to_string(),
        })
    }

    fn login_redirect_unless_public(&self, current_path: &str) -> Option<NavigationEffect> {
        (!self.config.is_public_path(current_path)).then(|| NavigationEffect {
            to: self.config.login_path.clone(),
            from: current_path.to_string(),
        })
    }
}
