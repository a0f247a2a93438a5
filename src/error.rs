/// Error taxonomy for the scan pipeline

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Everything that can go wrong between the scan button and the history
/// list. `Capture` and `Decode` surface in the popup status line; `Query`
/// and `Storage` degrade to defaults and a warning log.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("capture failed: {0}")]
    Capture(String),

    #[error("tab query failed: {0}")]
    Query(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("storage failed: {0}")]
    Storage(String),
}

/// Flatten a JS error value into a plain message string.
pub fn js_value_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}
