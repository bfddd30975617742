//! DOM tests for the content script and the sidebar list, run with `wasm-pack test --headless --chrome`.
#![cfg(target_arch = "wasm32")]

use chrono::Utc;
use js_sys::Function;
use pingpt::bookmark::{Bookmark, BookmarkDraft, Role};
use pingpt::browser::sleep;
use pingpt::config::ExtractorConfig;
use pingpt::content::{inject_pin_button, snapshot_page, ButtonState};
use pingpt::ui::components::{BookmarkList, BookmarkListProps};
use wasm_bindgen_test::*;
use web_sys::Document;
use yew::Callback;

wasm_bindgen_test_configure!(run_in_browser);

fn document_with(body: &str) -> Document {
    let document = web_sys::window().unwrap().document().unwrap();
    document.body().unwrap().set_inner_html(body);
    document
}

fn noop() -> Function {
    Function::new_no_args("")
}

#[wasm_bindgen_test]
fn test_button_appended_to_main() {
    let document = document_with("<main id=\"chat\"></main>");
    let config = ExtractorConfig::default();

    assert!(inject_pin_button(&document, &config, &noop()).unwrap());

    let button = document.get_element_by_id(&config.button_id).unwrap();
    assert_eq!(button.parent_element().unwrap().id(), "chat");
    assert_eq!(button.text_content().unwrap(), ButtonState::Idle.label());
}

#[wasm_bindgen_test]
fn test_injection_is_idempotent() {
    let document = document_with("<div></div>");
    let config = ExtractorConfig::default();

    assert!(inject_pin_button(&document, &config, &noop()).unwrap());
    assert!(!inject_pin_button(&document, &config, &noop()).unwrap());

    let buttons = document.query_selector_all(&format!("#{}", config.button_id)).unwrap();
    assert_eq!(buttons.length(), 1);
}

#[wasm_bindgen_test]
fn test_snapshot_reads_live_document() {
    let document = document_with(
        r#"<main>
            <h1 data-testid="conversation-title">Lifetimes</h1>
            <article data-testid="conversation-turn-1">
                <div data-message-author-role="user">What is 'static?</div>
            </article>
            <article data-testid="conversation-turn-2">
                <div data-message-author-role="assistant">A lifetime.</div>
            </article>
        </main>"#,
    );

    let snapshot = snapshot_page(&document, &ExtractorConfig::default()).unwrap();

    assert_eq!(snapshot.title, "Lifetimes");
    assert_eq!(snapshot.message_count, 2);
    assert_eq!(snapshot.messages[0].role, Role::User);
    assert_eq!(snapshot.content, "What is 'static?");
    assert_eq!(snapshot.url, document.location().unwrap().href().unwrap());
}

fn bookmark(id: &str, title: &str) -> Bookmark {
    Bookmark::from_draft(
        BookmarkDraft::new(title, format!("https://chatgpt.com/c/{}", id)),
        id.to_string(),
        Utc::now(),
    )
}

#[wasm_bindgen_test]
async fn test_bookmark_list_renders_a_card_per_bookmark() {
    let document = document_with("<div id=\"list-root\"></div>");
    let root = document.get_element_by_id("list-root").unwrap();
    let props = BookmarkListProps {
        bookmarks: vec![bookmark("a", "First"), bookmark("b", "Second")],
        editing: Some("b".to_string()),
        edit_value: "Second".to_string(),
        on_start_edit: Callback::noop(),
        on_edit_input: Callback::noop(),
        on_save_edit: Callback::noop(),
        on_cancel_edit: Callback::noop(),
        on_delete: Callback::noop(),
    };

    let _app = yew::Renderer::<BookmarkList>::with_root_and_props(root, props).render();
    sleep(50).await;

    assert_eq!(document.query_selector_all(".bookmark-card").unwrap().length(), 2);
    assert_eq!(document.query_selector_all(".bookmark-title-input").unwrap().length(), 1);
    let title = document.query_selector(".bookmark-title").unwrap().unwrap();
    assert_eq!(title.text_content().unwrap().trim(), "First");
}
