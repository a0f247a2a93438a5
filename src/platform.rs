/// Extension platform seam: API namespace probing and the uniform
/// deferred-value call contract over both completion-reporting shapes

use crate::error::{ScanError, js_value_message};
use crate::scan_data::TabInfo;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// How the host reports completion of an asynchronous extension API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiShape {
    /// `browser.*`: calls return a promise directly.
    Deferred,
    /// `chrome.*`: calls take a completion callback and report errors
    /// through `runtime.lastError`.
    Callback,
}

/// Handle to the extension API namespace, probed once. Every operation is
/// exposed as a deferred value regardless of the underlying shape.
#[derive(Clone)]
pub struct ExtensionApi {
    root: Object,
    shape: ApiShape,
}

impl ExtensionApi {
    /// Probe the global scope, preferring the promise-returning `browser`
    /// namespace over callback-style `chrome`.
    pub fn detect() -> Result<Self, String> {
        let global = js_sys::global();

        if let Some(root) = namespace(&global, "browser") {
            return Ok(ExtensionApi {
                root,
                shape: ApiShape::Deferred,
            });
        }
        if let Some(root) = namespace(&global, "chrome") {
            return Ok(ExtensionApi {
                root,
                shape: ApiShape::Callback,
            });
        }

        Err("extension API namespace not found".to_string())
    }

    /// Capture the visible area of the current window's active tab as a
    /// PNG data URL.
    pub async fn capture_visible_tab(&self) -> Result<String, ScanError> {
        let options = Object::new();
        Reflect::set(&options, &"format".into(), &"png".into())
            .map_err(|err| ScanError::Capture(js_value_message(&err)))?;

        let args = Array::new();
        args.push(&JsValue::NULL); // current window
        args.push(&options);

        let result = self
            .call(&["tabs", "captureVisibleTab"], &args)
            .await
            .map_err(ScanError::Capture)?;

        result
            .as_string()
            .filter(|data_url| !data_url.is_empty())
            .ok_or_else(|| ScanError::Capture("no image returned".to_string()))
    }

    /// Title and URL of the focused tab in the current window, or `None`
    /// when there is no active tab.
    pub async fn active_tab(&self) -> Result<Option<TabInfo>, ScanError> {
        let query = Object::new();
        Reflect::set(&query, &"active".into(), &JsValue::TRUE)
            .map_err(|err| ScanError::Query(js_value_message(&err)))?;
        Reflect::set(&query, &"currentWindow".into(), &JsValue::TRUE)
            .map_err(|err| ScanError::Query(js_value_message(&err)))?;

        let args = Array::new();
        args.push(&query);

        let result = self
            .call(&["tabs", "query"], &args)
            .await
            .map_err(ScanError::Query)?;

        let tabs = Array::from(result.as_ref());
        if tabs.length() == 0 {
            return Ok(None);
        }

        let first = tabs.get(0);
        Ok(Some(TabInfo {
            title: string_field(&first, "title"),
            url: string_field(&first, "url"),
        }))
    }

    /// Raw value stored under `key`, or `None` when absent.
    pub(crate) async fn storage_get(&self, key: &str) -> Result<Option<JsValue>, ScanError> {
        let args = Array::new();
        args.push(&JsValue::from_str(key));

        let result = self
            .call(&["storage", "local", "get"], &args)
            .await
            .map_err(ScanError::Storage)?;

        let value = Reflect::get(&result, &JsValue::from_str(key))
            .map_err(|err| ScanError::Storage(js_value_message(&err)))?;

        if value.is_undefined() || value.is_null() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    /// Persist one key/value pair.
    pub(crate) async fn storage_set(&self, key: &str, value: JsValue) -> Result<(), ScanError> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &value)
            .map_err(|err| ScanError::Storage(js_value_message(&err)))?;

        let args = Array::new();
        args.push(&items);

        self.call(&["storage", "local", "set"], &args)
            .await
            .map_err(ScanError::Storage)?;
        Ok(())
    }

    /// Resolve a dotted method path to its `this` binding and function.
    fn method(&self, path: &[&str]) -> Result<(JsValue, Function), String> {
        let mut target: JsValue = self.root.clone().into();
        let mut value: JsValue = target.clone();

        for segment in path {
            target = value.clone();
            value = Reflect::get(&target, &JsValue::from_str(segment))
                .map_err(|err| js_value_message(&err))?;
        }

        if value.is_undefined() || value.is_null() {
            return Err(format!("{} is unavailable", path.join(".")));
        }
        value
            .dyn_into::<Function>()
            .map(|function| (target, function))
            .map_err(|_| format!("{} is not callable", path.join(".")))
    }

    /// Invoke an asynchronous extension API method under the uniform
    /// deferred-value contract.
    async fn call(&self, path: &[&str], args: &Array) -> Result<JsValue, String> {
        let (target, function) = self.method(path)?;

        let promise = match self.shape {
            ApiShape::Deferred => {
                let returned = function
                    .apply(&target, args)
                    .map_err(|err| js_value_message(&err))?;
                Promise::resolve(&returned)
            }
            ApiShape::Callback => {
                let root = self.root.clone();
                Promise::new(&mut |resolve: Function, reject: Function| {
                    let root = root.clone();
                    let reject_on_throw = reject.clone();

                    let done = Closure::once_into_js(move |result: JsValue| {
                        match last_error(&root) {
                            Some(message) => {
                                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str(&message));
                            }
                            None => {
                                let _ = resolve.call1(&JsValue::NULL, &result);
                            }
                        }
                    });

                    let full_args = Array::from(args.as_ref());
                    full_args.push(&done);
                    if let Err(err) = function.apply(&target, &full_args) {
                        let _ = reject_on_throw.call1(&JsValue::NULL, &err);
                    }
                })
            }
        };

        JsFuture::from(promise)
            .await
            .map_err(|err| js_value_message(&err))
    }
}

/// Best-effort clipboard write. Absence of the API or a rejected write is
/// a silent no-op.
pub async fn copy_to_clipboard(text: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(navigator) = Reflect::get(&window, &"navigator".into()) else {
        return;
    };
    let Ok(clipboard) = Reflect::get(&navigator, &"clipboard".into()) else {
        return;
    };
    if clipboard.is_undefined() || clipboard.is_null() {
        return;
    }
    let Ok(write_text) = Reflect::get(&clipboard, &"writeText".into()) else {
        return;
    };
    let Ok(write_text) = write_text.dyn_into::<Function>() else {
        return;
    };

    if let Ok(returned) = write_text.call1(&clipboard, &JsValue::from_str(text)) {
        let _ = JsFuture::from(Promise::resolve(&returned)).await;
    }
}

fn namespace(global: &JsValue, name: &str) -> Option<Object> {
    let value = Reflect::get(global, &JsValue::from_str(name)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    value.dyn_into::<Object>().ok()
}

/// chrome-style error side channel: `runtime.lastError.message`.
fn last_error(root: &Object) -> Option<String> {
    let runtime = Reflect::get(root, &"runtime".into()).ok()?;
    let last = Reflect::get(&runtime, &"lastError".into()).ok()?;
    if last.is_undefined() || last.is_null() {
        return None;
    }

    let message = Reflect::get(&last, &"message".into())
        .ok()
        .and_then(|value| value.as_string());
    Some(message.unwrap_or_else(|| "unknown platform error".to_string()))
}

fn string_field(value: &JsValue, key: &str) -> String {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|field| field.as_string())
        .unwrap_or_default()
}
