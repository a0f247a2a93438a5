/// Storage adapter over the extension's local key-value store

use crate::error::ScanError;
use crate::platform::ExtensionApi;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Best-effort persistence facade. Reads degrade to a caller-supplied
/// default, writes log and swallow failures; neither ever surfaces an
/// error to the popup.
pub struct StorageAdapter {
    api: ExtensionApi,
}

impl StorageAdapter {
    pub fn new(api: ExtensionApi) -> Self {
        StorageAdapter { api }
    }

    /// Probe the extension API namespace and wrap its storage area.
    pub fn detect() -> Result<Self, ScanError> {
        ExtensionApi::detect()
            .map(Self::new)
            .map_err(ScanError::Storage)
    }

    /// Value stored under `key`, or `default` when the key is absent, the
    /// stored value is malformed, or the underlying call fails.
    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        decode_or_default(self.fetch(key).await, key, default)
    }

    /// Persist `value` under `key`. Failures are logged, never propagated.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let js_value = match serde_wasm_bindgen::to_value(value) {
            Ok(js_value) => js_value,
            Err(err) => {
                log::warn!("could not serialize value for {key}: {err}");
                return;
            }
        };

        if let Err(err) = self.api.storage_set(key, js_value).await {
            log::warn!("could not persist {key}: {err}");
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<Value>, ScanError> {
        match self.api.storage_get(key).await? {
            None => Ok(None),
            Some(raw) => serde_wasm_bindgen::from_value(raw).map(Some).map_err(|err| {
                ScanError::Storage(format!("value under {key} is not JSON-shaped: {err}"))
            }),
        }
    }
}

/// The soft-failure half of `get_or`, factored out of the JS boundary.
fn decode_or_default<T: DeserializeOwned>(
    fetched: Result<Option<Value>, ScanError>,
    key: &str,
    default: T,
) -> T {
    match fetched {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::warn!("malformed value under {key}, using default: {err}");
                default
            }
        },
        Ok(None) => default,
        Err(err) => {
            log::warn!("reading {key} failed, using default: {err}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_returns_default() {
        let value: Vec<String> =
            decode_or_default(Ok(None), "history", vec!["fallback".to_string()]);

        assert_eq!(value, vec!["fallback".to_string()]);
    }

    #[test]
    fn test_malformed_value_returns_default() {
        let fetched = Ok(Some(json!("not an array")));

        let value: Vec<String> = decode_or_default(fetched, "history", Vec::new());

        assert!(value.is_empty());
    }

    #[test]
    fn test_underlying_error_returns_default() {
        let fetched = Err(ScanError::Storage("simulated platform failure".to_string()));

        let value: u32 = decode_or_default(fetched, "counter", 7);

        assert_eq!(value, 7);
    }

    #[test]
    fn test_well_formed_value_is_decoded() {
        let fetched = Ok(Some(json!(["a", "b"])));

        let value: Vec<String> = decode_or_default(fetched, "history", Vec::new());

        assert_eq!(value, vec!["a".to_string(), "b".to_string()]);
    }
}
