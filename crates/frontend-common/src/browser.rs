//! Browser bindings: `localStorage` and the History API
//!
//! Browser handles are looked up on every call so the wrappers stay `Send`
//! and `Sync`.

use crate::routing::History;
use quill_http::session::{KeyValueStorage, StorageError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

fn js_error(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn local_storage() -> Result<Storage, StorageError> {
    let window =
        web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
    window
        .local_storage()
        .map_err(|err| StorageError::Unavailable(js_error(&err)))?
        .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
}

/// Credential persistence in `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStorage;

impl KeyValueStorage for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        local_storage()?
            .get_item(key)
            .map_err(|err| StorageError::Unavailable(js_error(&err)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::WriteRejected {
                key: key.to_string(),
                reason: js_error(&err),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        local_storage()?
            .remove_item(key)
            .map_err(|err| StorageError::WriteRejected {
                key: key.to_string(),
                reason: js_error(&err),
            })
    }
}

/// Reflects committed navigations in the address bar
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHistory;

impl History for BrowserHistory {
    fn push(&self, full_path: &str) {
        let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
            warn!("History API unavailable");
            return;
        };
        if let Err(err) = history.push_state_with_url(&JsValue::NULL, "", Some(full_path)) {
            warn!(path = full_path, error = %js_error(&err), "Failed to push history entry");
        }
    }
}

/// Path and query of the page as loaded, `/` when unavailable
pub fn initial_path() -> String {
    web_sys::window()
        .map(|w| w.location())
        .and_then(|location| {
            let path = location.pathname().ok()?;
            let search = location.search().unwrap_or_default();
            Some(format!("{path}{search}"))
        })
        .unwrap_or_else(|| "/".to_string())
}
