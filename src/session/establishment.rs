use crate::config::ESTABLISHMENT_STORAGE_KEY;
use crate::storage::SharedStore;
use crate::tprintln;

use super::identity::EstablishmentMembership;

/// Scoping layer over the authenticated user's establishment memberships.
/// The persisted selection is re-validated against current memberships on
/// every read; a stale or foreign id is replaced by the first membership.
/// `switch` is the sole write path for explicit changes.
pub struct EstablishmentSelector {
    store: SharedStore,
}

impl EstablishmentSelector {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    fn persisted(&self) -> Option<i64> {
        self.store
            .get(ESTABLISHMENT_STORAGE_KEY)
            .and_then(|raw| raw.parse::<i64>().ok())
    }

    fn persist(&self, id: i64) -> bool {
        match self.store.set(ESTABLISHMENT_STORAGE_KEY, &id.to_string()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist establishment selection");
                false
            }
        }
    }

    /// Validated read. Keeps a persisted id only while the user still belongs
    /// to it; otherwise auto-selects the first membership (payload order, no
    /// sort) and persists that. Empty memberships yield no selection.
    pub fn current(&self, memberships: &[EstablishmentMembership]) -> Option<i64> {
        if let Some(id) = self.persisted() {
            if memberships.iter().any(|m| m.id == id) {
                return Some(id);
            }
            tprintln!("establishment.current stale id={} replaced", id);
        }
        let first = memberships.first()?.id;
        self.persist(first);
        Some(first)
    }

    /// Alias for the boot-time read; selection semantics are identical.
    pub fn init(&self, memberships: &[EstablishmentMembership]) -> Option<i64> {
        self.current(memberships)
    }

    /// Explicit switch. Fails closed: an id outside current memberships (or a
    /// persistence failure) leaves the selection untouched.
    pub fn switch(&self, target: i64, memberships: &[EstablishmentMembership]) -> bool {
        if !memberships.iter().any(|m| m.id == target) {
            tprintln!("establishment.switch rejected id={}", target);
            return false;
        }
        self.persist(target)
    }

    /// Logout hygiene: drop the persisted selection entirely.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(ESTABLISHMENT_STORAGE_KEY) {
            tracing::warn!(error = %e, "failed to clear establishment selection");
        }
    }
}
