/// Bindings to the chrome.* extension APIs (see bridge.js)
use js_sys::{Function, Promise};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::{ExtensionConfig, StorageAreaKind};
use crate::error::BookmarkError;
use crate::hub::TabMessenger;
use crate::protocol::{Request, Response};
use crate::storage::StorageArea;

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = getStorage)]
    async fn get_storage(area: &str, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = setStorage)]
    async fn set_storage(area: &str, key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = sendRuntimeMessage)]
    async fn send_runtime_message(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = sendTabMessage)]
    async fn send_tab_message(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = addRuntimeMessageListener)]
    pub fn add_runtime_message_listener(handler: &Function);

    #[wasm_bindgen(js_name = removeRuntimeMessageListener)]
    pub fn remove_runtime_message_listener(handler: &Function);

    #[wasm_bindgen(js_name = addInstalledListener)]
    pub fn add_installed_listener(handler: &Function);
}

/// chrome.storage.sync or chrome.storage.local
#[derive(Debug, Clone, Copy)]
pub struct ChromeStorage {
    area: StorageAreaKind,
}

impl ChromeStorage {
    pub fn new(area: StorageAreaKind) -> Self {
        ChromeStorage { area }
    }
}

impl StorageArea for ChromeStorage {
    async fn read(&self, key: &str) -> Result<Option<Value>, BookmarkError> {
        let raw = get_storage(self.area.as_str(), key)
            .await
            .map_err(|e| BookmarkError::Storage(describe(&e)))?;

        if raw.is_null() || raw.is_undefined() {
            return Ok(None);
        }
        from_js(raw).map(Some).map_err(BookmarkError::Storage)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), BookmarkError> {
        let raw = to_js(&value).map_err(BookmarkError::Storage)?;
        set_storage(self.area.as_str(), key, raw)
            .await
            .map_err(|e| BookmarkError::Storage(describe(&e)))
    }
}

/// Relays requests to content scripts via chrome.tabs.sendMessage
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl TabMessenger for ChromeTabs {
    async fn send_to_tab(&self, tab_id: i32, request: &Request) -> Result<Response, String> {
        let reply = send_tab_message(tab_id, to_js(request)?)
            .await
            .map_err(|e| describe(&e))?;
        from_js(reply)
    }
}

/// Send a request to the background hub and wait for its reply.
pub async fn send_message(request: &Request) -> Result<Response, String> {
    let reply = send_runtime_message(to_js(request)?)
        .await
        .map_err(|e| describe(&e))?;
    from_js(reply)
}

/// Send a request and decode the reply's data; error replies become `Err`.
pub async fn request<T: DeserializeOwned>(request: &Request) -> Result<T, String> {
    send_message(request).await?.into_data()
}

/// Settings overrides always live in the sync area.
pub async fn load_config() -> ExtensionConfig {
    ExtensionConfig::load(&ChromeStorage::new(StorageAreaKind::Sync)).await
}

/// Resolve after `ms` milliseconds (window timers only).
pub async fn sleep(ms: u32) {
    let delay = i32::try_from(ms).unwrap_or(i32::MAX);
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .map(|window| {
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, delay)
                    .is_ok()
            })
            .unwrap_or(false);
        if !scheduled {
            warn!("No timer available; resuming immediately");
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Plain JS objects, never `Map`s, so chrome.* can clone them.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(value).map_err(|e| e.to_string())
}

/// Human-readable text for a thrown JS value
pub fn describe(error: &JsValue) -> String {
    if let Some(text) = error.as_string() {
        return text;
    }
    if let Some(err) = error.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", error)
}
