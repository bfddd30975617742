/// PinGPT - Chrome Extension for bookmarking ChatGPT conversations
/// Built with Rust + WASM + Yew

pub mod background;
pub mod bookmark;
pub mod browser;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod hub;
pub mod protocol;
pub mod storage;
pub mod ui;

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Entry point for the background service worker
#[wasm_bindgen]
pub fn start_background() {
    background::start();
}

// Entry point for the content script on ChatGPT pages
#[wasm_bindgen]
pub fn start_content_script() {
    content::start();
}

// Start the Yew app for the sidebar panel
#[wasm_bindgen]
pub fn start_sidebar() {
    spawn_local(async {
        let config = browser::load_config().await;
        yew::Renderer::<ui::sidebar::Sidebar>::with_props(ui::sidebar::SidebarProps {
            config: Rc::new(config),
        })
        .render();
    });
}
