//! JavaScript bindings for operations and editing sessions

use super::utils::js_error;
use crate::binding::MemorySurface;
use crate::config::EditorConfig;
use crate::ot::{Operation, Range, Selection, Style};
use crate::protocol::{operation_from_json, operation_to_json, ClientMessage};
use crate::session::EditorClient;
use wasm_bindgen::prelude::*;

/// JavaScript-friendly wrapper for Operation
#[wasm_bindgen]
pub struct WasmOperation {
    inner: Operation,
}

#[wasm_bindgen]
impl WasmOperation {
    /// Parse an operation from its JSON wire form
    #[wasm_bindgen(js_name = fromJSON)]
    pub fn from_json(json: &str) -> Result<WasmOperation, JsValue> {
        let inner = operation_from_json(json).map_err(|e| js_error("Invalid operation", e))?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = toJSON)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        operation_to_json(&self.inner).map_err(|e| js_error("JSON serialization failed", e))
    }

    #[wasm_bindgen(js_name = baseLength)]
    pub fn base_length(&self) -> usize {
        self.inner.base_length()
    }

    #[wasm_bindgen(js_name = targetLength)]
    pub fn target_length(&self) -> usize {
        self.inner.target_length()
    }

    #[wasm_bindgen(js_name = isNoop)]
    pub fn is_noop(&self) -> bool {
        self.inner.is_noop()
    }

    /// Apply to plain text
    #[wasm_bindgen(js_name = apply)]
    pub fn apply(&self, text: &str) -> Result<String, JsValue> {
        self.inner.apply(text).map_err(|e| js_error("Apply failed", e))
    }

    /// `this` then `other` as one operation
    #[wasm_bindgen(js_name = compose)]
    pub fn compose(&self, other: &WasmOperation) -> Result<WasmOperation, JsValue> {
        let inner = self
            .inner
            .compose(&other.inner)
            .map_err(|e| js_error("Compose failed", e))?;
        Ok(Self { inner })
    }

    /// Returns `[thisPrime, otherPrime]`; `this` wins insert ties
    #[wasm_bindgen(js_name = transform)]
    pub fn transform(&self, other: &WasmOperation) -> Result<js_sys::Array, JsValue> {
        let (a, b) = Operation::transform(&self.inner, &other.inner)
            .map_err(|e| js_error("Transform failed", e))?;
        let pair = js_sys::Array::new();
        pair.push(&JsValue::from(WasmOperation { inner: a }));
        pair.push(&JsValue::from(WasmOperation { inner: b }));
        Ok(pair)
    }

    /// Inverse with respect to the plain text it applies to
    #[wasm_bindgen(js_name = invert)]
    pub fn invert(&self, text: &str) -> Result<WasmOperation, JsValue> {
        let inner = self.inner.invert(text).map_err(|e| js_error("Invert failed", e))?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = transformIndex)]
    pub fn transform_index(&self, index: usize) -> usize {
        self.inner.transform_index(index)
    }
}

/// A headless editing session backed by an in-memory document
#[wasm_bindgen]
pub struct WasmEditorClient {
    inner: EditorClient<MemorySurface>,
}

#[wasm_bindgen]
impl WasmEditorClient {
    /// `config_json` uses the camelCase keys of the editor config
    #[wasm_bindgen(constructor)]
    pub fn new(
        text: &str,
        config_json: &str,
        revision: u64,
        client_id: String,
        color: &str,
    ) -> Result<WasmEditorClient, JsValue> {
        let config = EditorConfig::from_json_str(config_json).map_err(|e| js_error("Invalid config", e))?;
        let inner = EditorClient::new(MemorySurface::new(text), config, revision, client_id, color)
            .map_err(|e| js_error("Session setup failed", e))?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = value)]
    pub fn value(&self) -> String {
        self.inner.adapter().value()
    }

    #[wasm_bindgen(js_name = revision)]
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }

    /// Replace `[from, to)` with `text` as a user edit. Returns the message
    /// to send, if any.
    #[wasm_bindgen(js_name = edit)]
    pub fn edit(&mut self, from: usize, to: usize, text: &str) -> Result<Option<String>, JsValue> {
        let change = self
            .inner
            .adapter_mut()
            .surface_mut()
            .edit(from, to, text, Some("+input"));
        let message = self
            .inner
            .on_local_changes(&[change])
            .map_err(|e| js_error("Edit failed", e))?;
        message.map(|m| to_json(&m)).transpose()
    }

    /// Process one server message; returns a JSON array of replies
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, json: &str) -> Result<String, JsValue> {
        let replies = self
            .inner
            .handle_raw_message(json)
            .map_err(|e| js_error("Message failed", e))?;
        serde_json::to_string(&replies).map_err(|e| js_error("JSON serialization failed", e))
    }

    #[wasm_bindgen(js_name = undo)]
    pub fn undo(&mut self) -> Result<Option<String>, JsValue> {
        let message = self.inner.undo().map_err(|e| js_error("Undo failed", e))?;
        message.map(|m| to_json(&m)).transpose()
    }

    #[wasm_bindgen(js_name = redo)]
    pub fn redo(&mut self) -> Result<Option<String>, JsValue> {
        let message = self.inner.redo().map_err(|e| js_error("Redo failed", e))?;
        message.map(|m| to_json(&m)).transpose()
    }

    /// `style` is one of `bold`, `italic`, `underline`, `strike`. Returns
    /// `false` when the user may not change the whole range.
    #[wasm_bindgen(js_name = toggleMeta)]
    pub fn toggle_meta(&mut self, from: usize, to: usize, style: String) -> Result<JsValue, JsValue> {
        let style: Style = serde_json::from_value(serde_json::Value::String(style))
            .map_err(|e| js_error("Unknown style", e))?;
        let (outcome, message) = self
            .inner
            .toggle_meta(Range::new(from, to), style)
            .map_err(|e| js_error("Toggle failed", e))?;
        crate::console_log!("toggled {} of {} characters", outcome.toggled, outcome.requested);
        let result = js_sys::Object::new();
        js_sys::Reflect::set(&result, &"allowed".into(), &outcome.allowed.into())?;
        if let Some(message) = message {
            js_sys::Reflect::set(&result, &"message".into(), &to_json(&message)?.into())?;
        }
        Ok(result.into())
    }

    #[wasm_bindgen(js_name = setSelection)]
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        self.inner
            .adapter_mut()
            .set_selection(&Selection::new(vec![Range::new(anchor, head)]));
    }

    /// Presence message announcing the local selection
    #[wasm_bindgen(js_name = localPresence)]
    pub fn local_presence(&mut self) -> Result<String, JsValue> {
        to_json(&self.inner.local_presence())
    }

    #[wasm_bindgen(js_name = leave)]
    pub fn leave(&mut self) -> Result<String, JsValue> {
        to_json(&self.inner.leave())
    }
}

fn to_json(message: &ClientMessage) -> Result<String, JsValue> {
    message.to_json().map_err(|e| js_error("JSON serialization failed", e))
}
