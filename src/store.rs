use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StorageDuration;

/// Namespace prefix for all suppression keys.
pub const STORAGE_PREFIX: &str = "promo_popup_seen_";

/// One day in milliseconds.
pub const DAY_MS: u64 = 86_400_000;

/// Retention class of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Lives until the browsing session ends.
    Session,
    /// Survives sessions until explicitly removed.
    Persistent,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// Per-visitor key/value persistence, as the hosting environment provides
/// it. All operations are fallible; the [`SeenLedger`] above this trait is
/// what guarantees fail-open behavior.
pub trait KeyValueStore {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, scope: Scope, key: &str) -> Result<(), StoreError>;
}

// Shared single-threaded handle, so a test (or a host juggling several
// popup instances) can keep inspecting the store after handing it over.
impl<S: KeyValueStore> KeyValueStore for Rc<RefCell<S>> {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError> {
        self.borrow().get(scope, key)
    }

    fn set(&mut self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError> {
        self.borrow_mut().set(scope, key, value)
    }

    fn remove(&mut self, scope: Scope, key: &str) -> Result<(), StoreError> {
        self.borrow_mut().remove(scope, key)
    }
}

/// In-memory backing with both retention scopes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    session: HashMap<String, String>,
    persistent: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the start of a fresh browsing session.
    pub fn reset_session(&mut self) {
        self.session.clear();
    }

    fn map(&self, scope: Scope) -> &HashMap<String, String> {
        match scope {
            Scope::Session => &self.session,
            Scope::Persistent => &self.persistent,
        }
    }

    fn map_mut(&mut self, scope: Scope) -> &mut HashMap<String, String> {
        match scope {
            Scope::Session => &mut self.session,
            Scope::Persistent => &mut self.persistent,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map(scope).get(key).cloned())
    }

    fn set(&mut self, scope: Scope, key: &str, value: &str) -> Result<(), StoreError> {
        self.map_mut(scope).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, scope: Scope, key: &str) -> Result<(), StoreError> {
        self.map_mut(scope).remove(key);
        Ok(())
    }
}

/// Stable per-instance identifier: the popup's position among all popup
/// instances on the page at initialization time. Used solely to namespace
/// suppression keys; it does not survive navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
#[display("block_{_0}")]
pub struct PopupId(usize);

impl PopupId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn storage_key(&self) -> String {
        format!("{STORAGE_PREFIX}{self}")
    }
}

/// Duration-scoped record payload: an absolute expiry timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct SeenRecord {
    expires: u64,
}

const SESSION_SENTINEL: &str = "1";

fn scope_of(duration: StorageDuration) -> Scope {
    match duration {
        StorageDuration::Session => Scope::Session,
        StorageDuration::Days(_) => Scope::Persistent,
    }
}

/// Fail-open view over a [`KeyValueStore`]: a suppression failure degrades
/// to "show more often", never to an error.
#[derive(Debug, Clone, Default)]
pub struct SeenLedger<S> {
    store: S,
}

impl<S: KeyValueStore> SeenLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether this popup was already shown to the visitor. Never errors:
    /// any backend failure or corrupt payload reads as "not seen". Expired
    /// duration-scoped records read as "not seen" and are evicted.
    pub fn has_been_seen(
        &mut self,
        id: PopupId,
        duration: StorageDuration,
        now_ms: u64,
    ) -> bool {
        let key = id.storage_key();
        let raw = match self.store.get(scope_of(duration), &key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return false,
            Err(err) => {
                log::warn!("Suppression read failed for {id}: {err}");
                return false;
            }
        };

        match duration {
            StorageDuration::Session => true,
            StorageDuration::Days(_) => {
                let record: SeenRecord = match serde_json::from_str(&raw) {
                    Ok(record) => record,
                    Err(err) => {
                        log::warn!("Corrupt suppression record for {id}: {err}");
                        return false;
                    }
                };
                if now_ms > record.expires {
                    if let Err(err) = self.store.remove(Scope::Persistent, &key) {
                        log::warn!("Failed to evict expired record for {id}: {err}");
                    }
                    return false;
                }
                true
            }
        }
    }

    /// Records that this popup was shown. Best-effort: failures are
    /// swallowed with a warning, never retried.
    pub fn mark_seen(&mut self, id: PopupId, duration: StorageDuration, now_ms: u64) {
        let key = id.storage_key();
        let result = match duration {
            StorageDuration::Session => {
                self.store.set(Scope::Session, &key, SESSION_SENTINEL)
            }
            StorageDuration::Days(days) => {
                let expires = now_ms + (days * DAY_MS as f64) as u64;
                match serde_json::to_string(&SeenRecord { expires }) {
                    Ok(payload) => self.store.set(Scope::Persistent, &key, &payload),
                    Err(err) => {
                        log::warn!("Failed to encode suppression record for {id}: {err}");
                        return;
                    }
                }
            }
        };
        if let Err(err) = result {
            log::warn!("Failed to persist suppression for {id}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _scope: Scope, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable)
        }

        fn set(&mut self, _scope: Scope, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::QuotaExceeded)
        }

        fn remove(&mut self, _scope: Scope, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn storage_keys_are_namespaced_by_instance_position() {
        assert_eq!(PopupId::new(0).storage_key(), "promo_popup_seen_block_0");
        assert_eq!(PopupId::new(3).storage_key(), "promo_popup_seen_block_3");
    }

    #[test]
    fn session_scope_round_trips_and_resets() {
        let store = Rc::new(RefCell::new(MemoryStore::new()));
        let mut ledger = SeenLedger::new(store.clone());
        let id = PopupId::new(0);

        assert!(!ledger.has_been_seen(id, StorageDuration::Session, 0));
        ledger.mark_seen(id, StorageDuration::Session, 0);
        assert!(ledger.has_been_seen(id, StorageDuration::Session, 0));

        store.borrow_mut().reset_session();
        assert!(!ledger.has_been_seen(id, StorageDuration::Session, 0));
    }

    #[test]
    fn session_scope_never_touches_persistent_storage() {
        let store = Rc::new(RefCell::new(MemoryStore::new()));
        let mut ledger = SeenLedger::new(store.clone());
        let id = PopupId::new(1);

        ledger.mark_seen(id, StorageDuration::Session, 0);
        assert!(store.borrow().persistent.is_empty());
        assert_eq!(store.borrow().session.len(), 1);
    }

    #[test]
    fn duration_scope_expires_at_the_millisecond() {
        let store = Rc::new(RefCell::new(MemoryStore::new()));
        let mut ledger = SeenLedger::new(store.clone());
        let id = PopupId::new(0);
        let duration = StorageDuration::Days(7.0);
        let written_at = 1_000;
        let expires = written_at + 7 * DAY_MS;

        ledger.mark_seen(id, duration, written_at);
        assert!(ledger.has_been_seen(id, duration, expires - 1));
        assert!(ledger.has_been_seen(id, duration, expires));
        assert!(!ledger.has_been_seen(id, duration, expires + 1));

        // Expired record was evicted, not just ignored.
        let raw = store
            .borrow()
            .get(Scope::Persistent, &id.storage_key())
            .unwrap();
        assert!(raw.is_none());
    }

    #[test]
    fn duration_record_carries_an_absolute_expiry() {
        let store = Rc::new(RefCell::new(MemoryStore::new()));
        let mut ledger = SeenLedger::new(store.clone());
        let id = PopupId::new(2);

        ledger.mark_seen(id, StorageDuration::Days(7.0), 0);
        let raw = store
            .borrow()
            .get(Scope::Persistent, &id.storage_key())
            .unwrap()
            .unwrap();
        let record: SeenRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.expires, 7 * DAY_MS);
    }

    #[test]
    fn corrupt_records_read_as_not_seen() {
        let store = Rc::new(RefCell::new(MemoryStore::new()));
        store
            .borrow_mut()
            .set(Scope::Persistent, &PopupId::new(0).storage_key(), "not json")
            .unwrap();

        let mut ledger = SeenLedger::new(store);
        assert!(!ledger.has_been_seen(PopupId::new(0), StorageDuration::Days(1.0), 0));
    }

    #[test]
    fn backend_failures_never_propagate() {
        let mut ledger = SeenLedger::new(FailingStore);
        let id = PopupId::new(0);

        assert!(!ledger.has_been_seen(id, StorageDuration::Session, 0));
        assert!(!ledger.has_been_seen(id, StorageDuration::Days(1.0), 0));
        ledger.mark_seen(id, StorageDuration::Session, 0);
        ledger.mark_seen(id, StorageDuration::Days(1.0), 0);
    }

    #[test]
    fn instances_suppress_independently() {
        let mut ledger = SeenLedger::new(MemoryStore::new());
        ledger.mark_seen(PopupId::new(0), StorageDuration::Days(1.0), 0);

        assert!(ledger.has_been_seen(PopupId::new(0), StorageDuration::Days(1.0), 0));
        assert!(!ledger.has_been_seen(PopupId::new(1), StorageDuration::Days(1.0), 0));
    }
}
