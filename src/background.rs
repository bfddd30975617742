/// Background service worker: routes runtime messages through the hub
use std::cell::RefCell;

use js_sys::Promise;
use log::{debug, info};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

use crate::browser::{self, ChromeStorage, ChromeTabs};
use crate::hub::{Hub, MessageSender};
use crate::protocol::Response;
use crate::storage::BookmarkStore;

thread_local! {
    static ACTIVE: RefCell<Option<Background>> = const { RefCell::new(None) };
}

/// Register the message and install listeners (once per worker).
pub fn start() {
    ACTIVE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(Background::mount());
            info!("PinGPT background initialized");
        }
    });
}

/// Owns the registered listeners; dropping it unregisters the message handler.
pub struct Background {
    on_message: Closure<dyn FnMut(JsValue, JsValue) -> Promise>,
    _on_installed: Closure<dyn FnMut()>,
}

impl Background {
    pub fn mount() -> Background {
        let on_message = Closure::<dyn FnMut(JsValue, JsValue) -> Promise>::new(|raw: JsValue, sender: JsValue| {
            future_to_promise(handle_message(raw, sender))
        });
        browser::add_runtime_message_listener(on_message.as_ref().unchecked_ref());

        let on_installed = Closure::<dyn FnMut()>::new(|| {
            info!("PinGPT extension installed");
        });
        browser::add_installed_listener(on_installed.as_ref().unchecked_ref());

        Background {
            on_message,
            _on_installed: on_installed,
        }
    }
}

impl Drop for Background {
    fn drop(&mut self) {
        browser::remove_runtime_message_listener(self.on_message.as_ref().unchecked_ref());
    }
}

/// Settings are re-read per message so edits apply without a restart; the
/// hub itself holds no state between requests.
async fn handle_message(raw: JsValue, sender: JsValue) -> Result<JsValue, JsValue> {
    let sender: MessageSender = browser::from_js(sender).unwrap_or_default();
    let config = browser::load_config().await;
    let store = BookmarkStore::with_key(ChromeStorage::new(config.storage_area), config.storage_key.clone());
    let hub = Hub::new(store, ChromeTabs, config);

    let reply = match browser::from_js::<Value>(raw) {
        Ok(value) => hub.handle_json(value, &sender).await,
        Err(e) => Response::error(format!("Malformed message: {}", e)),
    };
    debug!("Replying {:?}", reply.status);

    browser::to_js(&reply).map_err(|e| JsValue::from_str(&e))
}
