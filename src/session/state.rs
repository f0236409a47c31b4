use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::tprintln;

use super::identity::UserIdentity;

/// The process-wide session record. `is_authenticated == true` implies
/// `user` is present; the constructors below are the only way this type is
/// built, which keeps that invariant structural.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub user: Option<UserIdentity>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// Boot-time state: nothing known yet, downstream redirects suppressed.
    pub fn booting() -> Self {
        Self { is_authenticated: false, user: None, is_loading: true, error: None }
    }

    pub fn authenticated(user: UserIdentity) -> Self {
        Self { is_authenticated: true, user: Some(user), is_loading: false, error: None }
    }

    pub fn unauthenticated(error: Option<String>) -> Self {
        Self { is_authenticated: false, user: None, is_loading: false, error }
    }

    pub fn is_settled(&self) -> bool { !self.is_loading }
}

/// Owned reactive session state. UI adapters subscribe; only the bootstrap
/// routine and explicit login/logout paths commit new states, each under a
/// monotonically increasing request id so a stale in-flight verification can
/// never clobber a newer result.
pub struct SessionHandle {
    tx: watch::Sender<AuthState>,
    next_request: AtomicU64,
    committed: Mutex<u64>,
}

impl Default for SessionHandle {
    fn default() -> Self { Self::new() }
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::booting());
        Self { tx, next_request: AtomicU64::new(1), committed: Mutex::new(0) }
    }

    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// Claim a request id before starting a verification. Ids are strictly
    /// increasing across bootstrap and login calls on this handle.
    pub fn begin_request(&self) -> u64 {
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }

    /// Commit the outcome of a verification. Returns false (and leaves state
    /// untouched) when a result from a newer request already settled.
    pub fn commit(&self, request_id: u64, state: AuthState) -> bool {
        let mut committed = self.committed.lock();
        if request_id < *committed {
            tprintln!("session.commit stale request={} committed={}", request_id, *committed);
            tracing::debug!(request_id, committed = *committed, "discarding stale verification result");
            return false;
        }
        *committed = request_id;
        self.tx.send_replace(state);
        true
    }

    /// Commit outside any verification race, e.g. logout. Claims a fresh id
    /// so anything still in flight becomes stale. If an even newer request
    /// commits in between, that result stands (last write wins).
    pub fn force(&self, state: AuthState) {
        let id = self.begin_request();
        let _ = self.commit(id, state);
    }
}
