#![forbid(unsafe_code)]

//! Process-wide settings facade.
//!
//! [`Settings`] adapts any backend holding [`serde_json::Value`] entries into a
//! typed [`KeyValueStore<T>`] for every `T: Serialize + DeserializeOwned`. The
//! backend itself (a preferences file, an OS registry, a remote config service)
//! is supplied by the caller; this module only encodes and decodes.
//!
//! One instance can be installed as the process global with
//! [`Settings::install`] at start-up and fetched anywhere with
//! [`Settings::global`]. There is no teardown.
//!
//! # Example
//!
//! ```
//! use propwrap::{MemoryStore, Settings};
//!
//! let settings = Settings::new(MemoryStore::new());
//! let mut dark_mode = settings.wrapper("ui.dark_mode", false);
//! assert!(!dark_mode.get().unwrap());
//!
//! dark_mode.set(true).unwrap();
//! assert!(dark_mode.get().unwrap());
//! ```

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::error::{BoxError, Result, WrapError};
use crate::store::{KeyValueStore, StoreBacked};
use crate::wrapper::ValueWrapper;

static GLOBAL: OnceLock<Settings> = OnceLock::new();

#[derive(Debug, Error)]
pub enum SettingsError {
    /// The backend failed; its error is kept as the source.
    #[error("settings backend failed: {0}")]
    Backend(#[source] BoxError),

    /// The stored entry does not decode as the requested type.
    #[error("setting `{key}` has an incompatible value: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value being written has no JSON representation.
    #[error("setting `{key}` could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<SettingsError> for WrapError {
    fn from(err: SettingsError) -> Self {
        WrapError::external(err)
    }
}

type DynBackend = dyn KeyValueStore<Value, Error = BoxError> + Send + Sync;

/// Erases a backend's error type so backends of any kind fit behind one box.
struct Erased<S>(S);

impl<S> KeyValueStore<Value> for Erased<S>
where
    S: KeyValueStore<Value>,
    S::Error: Into<BoxError>,
{
    type Error = BoxError;

    fn get(&self, key: &str) -> std::result::Result<Option<Value>, BoxError> {
        self.0.get(key).map_err(Into::into)
    }

    fn set(&self, key: &str, value: Value) -> std::result::Result<(), BoxError> {
        self.0.set(key, value).map_err(Into::into)
    }
}

/// Typed view over a JSON-valued backend.
pub struct Settings {
    backend: Box<DynBackend>,
}

impl Settings {
    pub fn new<S>(backend: S) -> Self
    where
        S: KeyValueStore<Value> + Send + Sync + 'static,
        S::Error: Into<BoxError>,
    {
        Self {
            backend: Box::new(Erased(backend)),
        }
    }

    /// Install `settings` as the process global.
    ///
    /// Fails with [`WrapError::InvalidConfiguration`] if a global is already
    /// installed; the existing one is kept.
    pub fn install(settings: Settings) -> Result<&'static Settings> {
        if GLOBAL.set(settings).is_err() {
            return Err(WrapError::invalid("global settings already installed"));
        }
        tracing::debug!(message = "settings.install");
        GLOBAL
            .get()
            .ok_or_else(|| WrapError::invalid("global settings unavailable after install"))
    }

    /// The process global, if one has been installed.
    #[must_use]
    pub fn global() -> Option<&'static Settings> {
        GLOBAL.get()
    }

    /// A wrapper whose value lives under `key`, defaulting to `default`.
    #[must_use]
    pub fn wrapper<T: Clone>(
        &self,
        key: impl Into<String>,
        default: T,
    ) -> ValueWrapper<T, StoreBacked<&Self, T>> {
        ValueWrapper::store_backed(self, key, default)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> KeyValueStore<T> for Settings {
    type Error = SettingsError;

    fn get(&self, key: &str) -> std::result::Result<Option<T>, SettingsError> {
        let Some(raw) = self.backend.get(key).map_err(SettingsError::Backend)? else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|source| SettingsError::Decode {
                key: key.to_owned(),
                source,
            })
    }

    fn set(&self, key: &str, value: T) -> std::result::Result<(), SettingsError> {
        let raw = serde_json::to_value(value).map_err(|source| SettingsError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.backend.set(key, raw).map_err(SettingsError::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        height: u32,
    }

    struct Offline;

    impl KeyValueStore<Value> for Offline {
        type Error = io::Error;

        fn get(&self, _key: &str) -> std::result::Result<Option<Value>, io::Error> {
            Err(io::Error::new(io::ErrorKind::NotConnected, "offline"))
        }

        fn set(&self, _key: &str, _value: Value) -> std::result::Result<(), io::Error> {
            Err(io::Error::new(io::ErrorKind::NotConnected, "offline"))
        }
    }

    #[test]
    fn typed_round_trip() {
        let settings = Settings::new(MemoryStore::new());
        let mut window = settings.wrapper(
            "window",
            Window {
                width: 640,
                height: 480,
            },
        );
        assert_eq!(window.get().unwrap().width, 640);

        window
            .set(Window {
                width: 1280,
                height: 720,
            })
            .unwrap();
        assert_eq!(
            window.get().unwrap(),
            Window {
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn entries_are_stored_as_json() {
        let backend = Arc::new(MemoryStore::<Value>::new());
        let settings = Settings::new(Arc::clone(&backend));
        settings.wrapper("launches", 0u32).set(3).unwrap();
        assert_eq!(backend.get("launches").unwrap(), Some(json!(3)));
    }

    #[test]
    fn incompatible_entry_is_decode_error() {
        let backend: MemoryStore<Value> = [("launches", json!("three"))].into_iter().collect();
        let settings = Settings::new(backend);
        let err = settings.wrapper("launches", 0u32).get().unwrap_err();
        match err {
            SettingsError::Decode { key, .. } => assert_eq!(key, "launches"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn unencodable_value_is_encode_error() {
        let backend = Arc::new(MemoryStore::<Value>::new());
        let settings = Settings::new(Arc::clone(&backend));
        let mut grid = settings.wrapper("grid", HashMap::<(u8, u8), u8>::new());

        let mut cells = HashMap::new();
        cells.insert((0, 0), 1);
        let err = grid.set(cells).unwrap_err();
        match &err {
            SettingsError::Encode { key, .. } => assert_eq!(key, "grid"),
            other => panic!("expected encode error, got {other:?}"),
        }
        assert!(err.to_string().contains("could not be encoded"));
        assert!(backend.is_empty());
        assert!(grid.stored().is_empty());
    }

    #[test]
    fn backend_failure_propagates() {
        let settings = Settings::new(Offline);
        let wrapper = settings.wrapper("anything", 1i32);
        let err = wrapper.get().unwrap_err();
        assert!(matches!(err, SettingsError::Backend(_)));
        assert!(err.to_string().contains("offline"));

        let folded = WrapError::from(err);
        assert!(folded.is_external());
    }

    #[test]
    fn missing_key_uses_default() {
        let settings = Settings::new(MemoryStore::new());
        let greeting = settings.wrapper("greeting", String::from("hello"));
        assert_eq!(greeting.get().unwrap(), "hello");
    }
}
