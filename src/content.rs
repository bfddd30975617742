/// Content script: pin button and conversation extraction on ChatGPT pages
use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use js_sys::{Function, Promise};
use log::{debug, error, info, warn};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlButtonElement, MutationObserver, MutationObserverInit};

use crate::browser::{self, describe};
use crate::config::{ExtensionConfig, ExtractorConfig};
use crate::extract::{extract_conversation, ConversationSnapshot};
use crate::protocol::{Request, Response};

const BUTTON_STYLE: &str = "position: fixed; top: 20px; right: 20px; z-index: 10000; padding: 8px 16px; background: #007bff; color: white; border: none; border-radius: 6px; cursor: pointer; font-size: 14px; font-weight: 500; box-shadow: 0 2px 4px rgba(0,0,0,0.2); transition: all 0.2s ease;";

thread_local! {
    static ACTIVE: RefCell<Option<ContentScript>> = const { RefCell::new(None) };
}

/// What the pin button currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Saving,
    Saved,
    Failed,
}

impl ButtonState {
    pub fn label(self) -> &'static str {
        match self {
            ButtonState::Idle => "📌 Pin Conversation",
            ButtonState::Saving => "⏳ Saving...",
            ButtonState::Saved => "✅ Saved!",
            ButtonState::Failed => "❌ Error",
        }
    }

    /// Only the idle button accepts clicks.
    pub fn is_disabled(self) -> bool {
        self != ButtonState::Idle
    }
}

/// Attach the content script once the document has finished loading.
pub fn start() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        warn!("No document; content script not started");
        return;
    };

    if document.ready_state() == "loading" {
        let on_ready = Closure::once_into_js(attach);
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
            error!("Could not wait for DOMContentLoaded: {}", describe(&e));
        }
    } else {
        attach();
    }
}

fn attach() {
    spawn_local(async {
        let config = browser::load_config().await;
        match ContentScript::mount(config) {
            Ok(script) => {
                ACTIVE.with(|slot| *slot.borrow_mut() = Some(script));
                detach_on_unload();
                info!("PinGPT content script initialized");
            }
            Err(e) => error!("Content script failed to start: {}", describe(&e)),
        }
    });
}

fn detach_on_unload() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let on_unload = Closure::once_into_js(|| {
        let script = ACTIVE.with(|slot| slot.borrow_mut().take());
        drop(script);
    });
    if let Err(e) = window.add_event_listener_with_callback("beforeunload", on_unload.unchecked_ref()) {
        warn!("Could not register unload handler: {}", describe(&e));
    }
}

/// Owns every handler the content script registers; dropping it detaches them.
pub struct ContentScript {
    observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut()>,
    on_message: Closure<dyn FnMut(JsValue, JsValue) -> Promise>,
}

impl ContentScript {
    pub fn mount(config: ExtensionConfig) -> Result<ContentScript, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let page = Rc::new(Page::new(document, Rc::new(config)));
        page.inject_button()?;

        // Re-inject the button whenever the page re-renders it away
        let on_mutation = {
            let page = page.clone();
            Closure::<dyn FnMut()>::new(move || {
                if let Err(e) = page.inject_button() {
                    warn!("Could not re-inject pin button: {}", describe(&e));
                }
            })
        };
        let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Some(body) = page.document.body() {
            observer.observe_with_options(&body, &options)?;
        }

        let on_message = {
            let page = page.clone();
            Closure::<dyn FnMut(JsValue, JsValue) -> Promise>::new(move |raw: JsValue, _sender: JsValue| {
                let reply = match browser::from_js::<Value>(raw) {
                    Ok(value) => match Request::from_value(value) {
                        Ok(request) => page.handle(request),
                        Err(e) => Response::error(e.to_string()),
                    },
                    Err(e) => Response::error(format!("Malformed message: {}", e)),
                };
                match browser::to_js(&reply) {
                    Ok(js) => Promise::resolve(&js),
                    Err(e) => Promise::reject(&JsValue::from_str(&e)),
                }
            })
        };
        browser::add_runtime_message_listener(on_message.as_ref().unchecked_ref());

        Ok(ContentScript {
            observer,
            _on_mutation: on_mutation,
            on_message,
        })
    }
}

impl Drop for ContentScript {
    fn drop(&mut self) {
        self.observer.disconnect();
        browser::remove_runtime_message_listener(self.on_message.as_ref().unchecked_ref());
        debug!("PinGPT content script detached");
    }
}

struct Page {
    document: Document,
    config: Rc<ExtensionConfig>,
    on_click: Closure<dyn FnMut()>,
}

impl Page {
    fn new(document: Document, config: Rc<ExtensionConfig>) -> Page {
        let on_click = {
            let document = document.clone();
            let config = config.clone();
            Closure::<dyn FnMut()>::new(move || {
                spawn_local(pin_conversation(document.clone(), config.clone()));
            })
        };

        Page {
            document,
            config,
            on_click,
        }
    }

    fn inject_button(&self) -> Result<(), JsValue> {
        let injected = inject_pin_button(
            &self.document,
            &self.config.extractor,
            self.on_click.as_ref().unchecked_ref(),
        )?;
        if injected {
            debug!("Pin button injected");
        }
        Ok(())
    }

    fn handle(&self, request: Request) -> Response {
        match request {
            Request::ExtractConversation => {
                let reply = snapshot_page(&self.document, &self.config.extractor)
                    .and_then(|snapshot| Response::with_data(&snapshot).map_err(|e| e.to_string()));
                reply.unwrap_or_else(|e| Response::error(format!("Failed to extract conversation content: {}", e)))
            }
            Request::InjectBookmarkButton => match self.inject_button() {
                Ok(()) => Response::success(),
                Err(e) => Response::error(describe(&e)),
            },
            other => Response::error(format!("Unknown action: {}", other.action())),
        }
    }
}

/// Add the pin button unless it is already on the page. Returns whether a
/// button was added.
pub fn inject_pin_button(document: &Document, config: &ExtractorConfig, on_click: &Function) -> Result<bool, JsValue> {
    if document.get_element_by_id(&config.button_id).is_some() {
        return Ok(false);
    }

    let button: HtmlButtonElement = document.create_element("button")?.dyn_into()?;
    button.set_id(&config.button_id);
    button.set_attribute("style", BUTTON_STYLE)?;
    button.set_onclick(Some(on_click));
    apply_state(&button, ButtonState::Idle);

    mount_point(document, config)?.append_child(&button)?;
    Ok(true)
}

/// First existing element among the configured mount selectors, else `body`.
fn mount_point(document: &Document, config: &ExtractorConfig) -> Result<Element, JsValue> {
    for selector in &config.mount_selectors {
        if let Some(target) = document.query_selector(selector)? {
            return Ok(target);
        }
    }
    document
        .body()
        .map(Element::from)
        .ok_or_else(|| JsValue::from_str("document has no body"))
}

/// Serialize the live document and run extraction over it.
pub fn snapshot_page(document: &Document, config: &ExtractorConfig) -> Result<ConversationSnapshot, String> {
    let html = document
        .document_element()
        .map(|root| root.outer_html())
        .ok_or_else(|| "document has no root element".to_string())?;
    let url = document
        .location()
        .ok_or_else(|| "document has no location".to_string())?
        .href()
        .map_err(|e| describe(&e))?;

    Ok(extract_conversation(&html, &url, config, Utc::now()))
}

async fn pin_conversation(document: Document, config: Rc<ExtensionConfig>) {
    let Some(button) = document
        .get_element_by_id(&config.extractor.button_id)
        .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
    else {
        return;
    };

    apply_state(&button, ButtonState::Saving);

    let outcome = match snapshot_page(&document, &config.extractor) {
        Ok(snapshot) => browser::request::<()>(&Request::SaveBookmark(snapshot.into_draft())).await,
        Err(e) => Err(e),
    };

    let state = match outcome {
        Ok(()) => {
            info!("Conversation pinned");
            ButtonState::Saved
        }
        Err(message) => {
            error!("Failed to save bookmark: {}", message);
            ButtonState::Failed
        }
    };
    apply_state(&button, state);

    browser::sleep(config.button_reset_ms).await;
    apply_state(&button, ButtonState::Idle);
}

fn apply_state(button: &HtmlButtonElement, state: ButtonState) {
    button.set_text_content(Some(state.label()));
    button.set_disabled(state.is_disabled());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_labels() {
        assert_eq!(ButtonState::Idle.label(), "📌 Pin Conversation");
        assert_eq!(ButtonState::Saving.label(), "⏳ Saving...");
        assert_eq!(ButtonState::Saved.label(), "✅ Saved!");
        assert_eq!(ButtonState::Failed.label(), "❌ Error");
    }

    #[test]
    fn test_only_idle_button_is_enabled() {
        assert!(!ButtonState::Idle.is_disabled());
        assert!(ButtonState::Saving.is_disabled());
        assert!(ButtonState::Saved.is_disabled());
        assert!(ButtonState::Failed.is_disabled());
    }
}
