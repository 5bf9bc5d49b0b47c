//! JSON encoding for the typed slots. Failures are logged here and turned
//! into "absent" / no-op, so the caches above never see an error.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::slot::KeyValueStore;

pub(crate) async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!(key, error = %e, "Failed to read local slot");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, len = raw.len(), "Discarding malformed local slot");
            None
        }
    }
}

/// Returns whether the value reached the slot.
pub(crate) async fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            error!(key, error = %e, "Failed to encode local slot");
            return false;
        }
    };

    match store.set(key, &json).await {
        Ok(()) => true,
        Err(e) => {
            error!(key, error = %e, "Failed to write local slot");
            false
        }
    }
}

pub(crate) async fn remove(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key).await {
        error!(key, error = %e, "Failed to clear local slot");
    }
}
