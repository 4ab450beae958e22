//! Durable key-value storage behind the session.
//!
//! In the browser this is `window.localStorage`. Hosts without it (tests,
//! Web Workers, native builds) fall back to an in-memory map that lives as
//! long as the WASM instance.

use std::collections::HashMap;

use crate::error::MatchError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, MatchError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), MatchError>;
    /// Wipe everything, not just the keys this crate wrote.
    fn clear(&mut self) -> Result<(), MatchError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, MatchError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), MatchError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), MatchError> {
        self.items.clear();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::KeyValueStore;
    use crate::error::MatchError;
    use wasm_bindgen::JsValue;

    fn storage_error(op: &str, err: JsValue) -> MatchError {
        MatchError::Storage(format!("localStorage {} failed: {:?}", op, err))
    }

    /// `window.localStorage`.
    pub struct BrowserStorage {
        storage: web_sys::Storage,
    }

    impl BrowserStorage {
        /// `None` when there is no window (Web Worker) or storage is disabled.
        pub fn local() -> Option<Self> {
            let storage = web_sys::window()?.local_storage().ok()??;
            Some(Self { storage })
        }
    }

    impl KeyValueStore for BrowserStorage {
        fn get(&self, key: &str) -> Result<Option<String>, MatchError> {
            self.storage.get_item(key).map_err(|e| storage_error("get", e))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), MatchError> {
            self.storage
                .set_item(key, value)
                .map_err(|e| storage_error("set", e))
        }

        fn clear(&mut self) -> Result<(), MatchError> {
            self.storage.clear().map_err(|e| storage_error("clear", e))
        }
    }
}

/// The best store available on this host.
pub fn default_store() -> Box<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(storage) = BrowserStorage::local() {
            return Box::new(storage);
        }
        log::warn!("localStorage unavailable; session state will not survive a reload");
    }
    Box::new(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_basic_ops() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.set("a", "3").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        store.clear().unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), None);
    }
}
