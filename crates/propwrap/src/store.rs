#![forbid(unsafe_code)]

//! External key-value store capability and the store-backed policy.
//!
//! [`StoreBacked`] treats an injected [`KeyValueStore`] as the source of truth:
//! reads ask the store (falling back to a default when the key is absent) and
//! writes go straight to the store. The wrapper's own slot only mirrors the last
//! successful write.
//!
//! Store failures are returned to the caller unchanged. Nothing here retries.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::policy::AccessPolicy;
use crate::wrapper::ValueWrapper;

/// A keyed store of `T` values supplied by the caller.
///
/// Methods take `&self`; implementations own their synchronisation.
pub trait KeyValueStore<T> {
    type Error;

    /// `Ok(None)` when the key has no entry.
    fn get(&self, key: &str) -> Result<Option<T>, Self::Error>;

    fn set(&self, key: &str, value: T) -> Result<(), Self::Error>;
}

impl<T, S: KeyValueStore<T> + ?Sized> KeyValueStore<T> for &S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<T>, S::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: T) -> Result<(), S::Error> {
        (**self).set(key, value)
    }
}

impl<T, S: KeyValueStore<T> + ?Sized> KeyValueStore<T> for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<T>, S::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: T) -> Result<(), S::Error> {
        (**self).set(key, value)
    }
}

impl<T, S: KeyValueStore<T> + ?Sized> KeyValueStore<T> for Box<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<T>, S::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: T) -> Result<(), S::Error> {
        (**self).set(key, value)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store behind a mutex. Not persistent.
pub struct MemoryStore<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> MemoryStore<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, T>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `key`, returning its previous value.
    pub fn remove(&self, key: &str) -> Option<T> {
        self.entries().remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for MemoryStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &*self.entries())
            .finish()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for MemoryStore<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self {
            entries: Mutex::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl<T: Clone> KeyValueStore<T> for MemoryStore<T> {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<T>, Infallible> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: T) -> Result<(), Infallible> {
        self.entries().insert(key.to_owned(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StoreBacked
// ---------------------------------------------------------------------------

/// Policy delegating reads and writes for one key to an external store.
///
/// `read` returns the store's entry, or `default` when there is none. `write`
/// stores the new value and then hands it back so the wrapper's slot mirrors it.
#[derive(Debug, Clone)]
pub struct StoreBacked<S, T> {
    store: S,
    key: String,
    default: T,
}

impl<S, T> StoreBacked<S, T> {
    #[must_use]
    pub fn new(store: S, key: impl Into<String>, default: T) -> Self {
        Self {
            store,
            key: key.into(),
            default,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn default_value(&self) -> &T {
        &self.default
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore<T>, T: Clone> AccessPolicy<T> for StoreBacked<S, T> {
    type Error = S::Error;

    fn read(&self, _stored: &T) -> Result<T, S::Error> {
        match self.store.get(&self.key) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                tracing::trace!(message = "store.default", key = %self.key);
                Ok(self.default.clone())
            }
            Err(err) => {
                tracing::warn!(message = "store.read_failed", key = %self.key);
                Err(err)
            }
        }
    }

    fn write(&self, new: T, _stored: &T) -> Result<T, S::Error> {
        self.store.set(&self.key, new.clone()).inspect_err(|_| {
            tracing::warn!(message = "store.write_failed", key = %self.key);
        })?;
        Ok(new)
    }
}

impl<S, T: Clone> ValueWrapper<T, StoreBacked<S, T>> {
    /// Wrapper whose value lives in `store` under `key`, defaulting to `default`.
    #[must_use]
    pub fn store_backed(store: S, key: impl Into<String>, default: T) -> Self {
        let slot = default.clone();
        ValueWrapper::with_policy(slot, StoreBacked::new(store, key, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use tracing_test::traced_test;

    /// Store whose reads and writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore<u32>,
        fail_reads: Cell<bool>,
        fail_writes: Cell<bool>,
    }

    impl KeyValueStore<u32> for FlakyStore {
        type Error = io::Error;

        fn get(&self, key: &str) -> Result<Option<u32>, io::Error> {
            if self.fail_reads.get() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
            }
            Ok(self.inner.get(key).unwrap_or_default())
        }

        fn set(&self, key: &str, value: u32) -> Result<(), io::Error> {
            if self.fail_writes.get() {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read only"));
            }
            let _ = self.inner.set(key, value);
            Ok(())
        }
    }

    #[test]
    fn missing_key_reads_default() {
        let store = MemoryStore::<bool>::new();
        let w = ValueWrapper::store_backed(&store, "first_launch", true);
        assert!(w.get().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryStore::<u8>::new();
        let mut w = ValueWrapper::store_backed(&store, "volume", 5u8);
        w.set(9).unwrap();
        assert_eq!(w.get().unwrap(), 9);
        assert_eq!(store.get("volume").unwrap(), Some(9));
        assert_eq!(*w.stored(), 9);
    }

    #[test]
    fn store_is_the_source_of_truth() {
        let store = Arc::new(MemoryStore::<String>::new());
        let w = ValueWrapper::store_backed(Arc::clone(&store), "name", String::from("anon"));
        store.set("name", "ada".to_string()).unwrap();
        assert_eq!(w.get().unwrap(), "ada");
        assert_eq!(w.stored(), "anon");
    }

    #[test]
    fn two_wrappers_share_a_key() {
        let store = MemoryStore::<i64>::new();
        let mut writer = ValueWrapper::store_backed(&store, "count", 0i64);
        let reader = ValueWrapper::store_backed(&store, "count", 0i64);
        writer.set(12).unwrap();
        assert_eq!(reader.get().unwrap(), 12);
    }

    #[test]
    fn read_failure_propagates_verbatim() {
        let store = FlakyStore::default();
        let w = ValueWrapper::store_backed(&store, "k", 1u32);
        store.fail_reads.set(true);
        let err = w.get().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn failed_write_leaves_slot_untouched() {
        let store = FlakyStore::default();
        let mut w = ValueWrapper::store_backed(&store, "k", 1u32);
        w.set(2).unwrap();
        store.fail_writes.set(true);
        let err = w.set(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(*w.stored(), 2);
        assert_eq!(w.get().unwrap(), 2);
    }

    #[test]
    #[traced_test]
    fn write_failure_is_logged_with_key() {
        let store = FlakyStore::default();
        store.fail_writes.set(true);
        let mut w = ValueWrapper::store_backed(&store, "brightness", 1u32);
        assert!(w.set(4).is_err());
        assert!(logs_contain("store.write_failed"));
        assert!(logs_contain("brightness"));
    }

    #[test]
    fn memory_store_basics() {
        let store: MemoryStore<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("a"));
        assert_eq!(store.remove("a"), Some(1));
        assert!(!store.contains_key("a"));
        assert_eq!(store.get("b").unwrap(), Some(2));
    }

    #[test]
    fn policy_accessors() {
        let store = MemoryStore::<u8>::new();
        let w = ValueWrapper::store_backed(&store, "key", 7);
        assert_eq!(w.policy().key(), "key");
        assert_eq!(*w.policy().default_value(), 7);
    }
}
