//! Background message hub.
//!
//! Stateless router between page scripts and the bookmark store. Each request
//! is handled independently and every failure becomes an error reply.

use log::{debug, error};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ExtensionConfig;
use crate::error::HubError;
use crate::protocol::{Request, Response};
use crate::storage::{BookmarkStore, StorageArea};

/// Tab a message came from (`chrome.runtime.MessageSender.tab`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SenderTab {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Sender metadata; `tab` is absent for extension pages such as the sidebar.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MessageSender {
    #[serde(default)]
    pub tab: Option<SenderTab>,
}

/// Delivers a request to the content script running in a tab.
#[allow(async_fn_in_trait)]
pub trait TabMessenger {
    async fn send_to_tab(&self, tab_id: i32, request: &Request) -> Result<Response, String>;
}

pub struct Hub<S, T> {
    store: BookmarkStore<S>,
    tabs: T,
    config: ExtensionConfig,
}

impl<S: StorageArea, T: TabMessenger> Hub<S, T> {
    pub fn new(store: BookmarkStore<S>, tabs: T, config: ExtensionConfig) -> Self {
        Hub { store, tabs, config }
    }

    /// Decode and dispatch a raw message as received from the browser.
    pub async fn handle_json(&self, raw: Value, sender: &MessageSender) -> Response {
        match Request::from_value(raw) {
            Ok(request) => self.dispatch(request, sender).await,
            Err(e) => {
                error!("Rejected message: {}", e);
                Response::error(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, request: Request, sender: &MessageSender) -> Response {
        let action = request.action();
        debug!("Dispatching {}", action);

        match self.route(request, sender).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("{} failed: {}", action, e);
                Response::error(e.to_string())
            }
        }
    }

    async fn route(&self, request: Request, sender: &MessageSender) -> Result<Response, HubError> {
        match request {
            Request::SaveBookmark(draft) => {
                self.store.save_bookmark(draft).await?;
                Ok(Response::with_message("Bookmark saved successfully"))
            }
            Request::GetBookmarks => Ok(Response::with_data(&self.store.get_bookmarks().await)?),
            Request::DeleteBookmark { id } => {
                self.store.delete_bookmark(&id).await?;
                Ok(Response::with_message("Bookmark deleted successfully"))
            }
            Request::UpdateBookmark { id, bookmark } => {
                self.store.update_bookmark(&id, bookmark).await?;
                Ok(Response::with_message("Bookmark updated successfully"))
            }
            Request::SearchBookmarks { query } => {
                Ok(Response::with_data(&self.store.search_bookmarks(&query).await)?)
            }
            Request::ExtractChatGptConversation => {
                let tab_id = self.chat_tab(sender)?;
                let reply = self.relay(tab_id, &Request::ExtractConversation).await?;
                if reply.is_success() {
                    Ok(reply)
                } else {
                    Err(HubError::Extraction(reply.message.unwrap_or_default()))
                }
            }
            request @ (Request::ExtractConversation | Request::InjectBookmarkButton) => {
                let tab_id = sender_tab_id(sender, request.action())?;
                self.relay(tab_id, &request).await
            }
        }
    }

    /// ID of the sender tab, provided it shows a ChatGPT page.
    fn chat_tab(&self, sender: &MessageSender) -> Result<i32, HubError> {
        let tab = sender
            .tab
            .as_ref()
            .ok_or(HubError::MissingTab("extractChatGPTConversation"))?;

        let on_chat_page = tab
            .url
            .as_deref()
            .and_then(|url| Url::parse(url).ok())
            .and_then(|url| url.host_str().map(|host| self.config.is_chat_host(host)))
            .unwrap_or(false);

        if !on_chat_page {
            return Err(HubError::NotChatPage);
        }
        tab.id.ok_or(HubError::MissingTab("extractChatGPTConversation"))
    }

    async fn relay(&self, tab_id: i32, request: &Request) -> Result<Response, HubError> {
        self.tabs
            .send_to_tab(tab_id, request)
            .await
            .map_err(HubError::Messaging)
    }
}

fn sender_tab_id(sender: &MessageSender, action: &'static str) -> Result<i32, HubError> {
    sender
        .tab
        .as_ref()
        .and_then(|tab| tab.id)
        .ok_or(HubError::MissingTab(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::{Bookmark, BookmarkDraft};
    use crate::protocol::Status;
    use crate::storage::MemoryStorage;
    use futures::executor::block_on;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records relayed requests and answers with a canned reply.
    struct FakeTabs {
        reply: Result<Response, String>,
        sent: RefCell<Vec<(i32, Request)>>,
    }

    impl FakeTabs {
        fn replying(reply: Result<Response, String>) -> Self {
            FakeTabs {
                reply,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl TabMessenger for FakeTabs {
        async fn send_to_tab(&self, tab_id: i32, request: &Request) -> Result<Response, String> {
            self.sent.borrow_mut().push((tab_id, request.clone()));
            self.reply.clone()
        }
    }

    fn hub_with(tabs: FakeTabs) -> Hub<MemoryStorage, FakeTabs> {
        Hub::new(BookmarkStore::new(MemoryStorage::new()), tabs, ExtensionConfig::default())
    }

    fn hub() -> Hub<MemoryStorage, FakeTabs> {
        hub_with(FakeTabs::replying(Ok(Response::success())))
    }

    fn sidebar() -> MessageSender {
        MessageSender::default()
    }

    fn tab(id: i32, url: &str) -> MessageSender {
        MessageSender {
            tab: Some(SenderTab {
                id: Some(id),
                url: Some(url.to_string()),
            }),
        }
    }

    fn bookmarks(hub: &Hub<MemoryStorage, FakeTabs>) -> Vec<Bookmark> {
        let reply = block_on(hub.dispatch(Request::GetBookmarks, &sidebar()));
        reply.into_data().unwrap()
    }

    #[test]
    fn test_save_then_get() {
        let hub = hub();
        let raw = json!({ "action": "saveBookmark", "data": { "title": "Chat", "url": "https://chatgpt.com/c/1" } });

        let reply = block_on(hub.handle_json(raw, &sidebar()));

        assert_eq!(reply, Response::with_message("Bookmark saved successfully"));
        let stored = bookmarks(&hub);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Chat");
    }

    #[test]
    fn test_save_invalid_replies_error() {
        let hub = hub();
        let raw = json!({ "action": "saveBookmark", "data": { "url": "https://example.com" } });

        let reply = block_on(hub.handle_json(raw, &sidebar()));

        assert_eq!(reply.status, Status::Error);
        assert!(reply.message.unwrap().starts_with("Invalid bookmark data"));
        assert!(bookmarks(&hub).is_empty());
    }

    #[test]
    fn test_update_delete_and_search() {
        let hub = hub();
        for (title, url) in [("JavaScript Tutorial", "https://test1.com"), ("Python Guide", "https://test2.com")] {
            block_on(hub.dispatch(Request::SaveBookmark(BookmarkDraft::new(title, url)), &sidebar()));
        }
        let first = bookmarks(&hub)[0].clone();

        let reply = block_on(hub.dispatch(
            Request::UpdateBookmark {
                id: first.id.clone(),
                bookmark: BookmarkDraft::from(&first).with_title("TypeScript Tutorial"),
            },
            &sidebar(),
        ));
        assert_eq!(reply.message.as_deref(), Some("Bookmark updated successfully"));

        let found: Vec<Bookmark> = block_on(hub.dispatch(
            Request::SearchBookmarks { query: "typescript".to_string() },
            &sidebar(),
        ))
        .into_data()
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, first.id);

        let reply = block_on(hub.dispatch(Request::DeleteBookmark { id: first.id.clone() }, &sidebar()));
        assert!(reply.is_success());
        assert_eq!(bookmarks(&hub).len(), 1);
    }

    #[test]
    fn test_update_unknown_id_replies_not_found() {
        let hub = hub();

        let reply = block_on(hub.dispatch(
            Request::UpdateBookmark {
                id: "missing".to_string(),
                bookmark: BookmarkDraft::new("Test", "https://test.com"),
            },
            &sidebar(),
        ));

        assert_eq!(reply, Response::error("Bookmark not found: missing"));
    }

    #[test]
    fn test_unknown_action_replies_error() {
        let reply = block_on(hub().handle_json(json!({ "action": "nope" }), &sidebar()));
        assert_eq!(reply, Response::error("Unknown action: nope"));
    }

    #[test]
    fn test_extract_requires_chat_page() {
        let hub = hub();

        let reply = block_on(hub.dispatch(Request::ExtractChatGptConversation, &tab(3, "https://example.com/c/1")));
        assert_eq!(reply, Response::error("Not a ChatGPT page"));

        let reply = block_on(hub.dispatch(Request::ExtractChatGptConversation, &sidebar()));
        assert_eq!(reply, Response::error("No sender tab for extractChatGPTConversation"));

        assert!(hub.tabs.sent.borrow().is_empty());
    }

    #[test]
    fn test_extract_asks_content_script() {
        let snapshot = json!({ "title": "Chat", "url": "https://chatgpt.com/c/1" });
        let hub = hub_with(FakeTabs::replying(Ok(Response {
            data: Some(snapshot.clone()),
            ..Response::success()
        })));

        let reply = block_on(hub.dispatch(Request::ExtractChatGptConversation, &tab(7, "https://chatgpt.com/c/1")));

        assert_eq!(reply.data, Some(snapshot));
        assert_eq!(*hub.tabs.sent.borrow(), vec![(7, Request::ExtractConversation)]);
    }

    #[test]
    fn test_extract_surfaces_content_script_failure() {
        let hub = hub_with(FakeTabs::replying(Ok(Response::error("no DOM"))));

        let reply = block_on(hub.dispatch(Request::ExtractChatGptConversation, &tab(7, "https://chat.openai.com/c/1")));

        assert_eq!(reply, Response::error("Failed to extract conversation content: no DOM"));
    }

    #[test]
    fn test_content_actions_are_relayed_to_sender_tab() {
        let hub = hub();

        let reply = block_on(hub.dispatch(Request::InjectBookmarkButton, &tab(4, "https://chatgpt.com/")));

        assert!(reply.is_success());
        assert_eq!(*hub.tabs.sent.borrow(), vec![(4, Request::InjectBookmarkButton)]);
    }

    #[test]
    fn test_relay_failure_replies_error() {
        let hub = hub_with(FakeTabs::replying(Err("Receiving end does not exist.".to_string())));

        let reply = block_on(hub.dispatch(Request::ExtractConversation, &tab(4, "https://chatgpt.com/")));

        assert_eq!(reply, Response::error("Messaging failed: Receiving end does not exist."));
    }

    #[test]
    fn test_sender_deserializes_from_chrome_shape() {
        let sender: MessageSender = serde_json::from_value(json!({
            "id": "extension-id",
            "tab": { "id": 12, "url": "https://chatgpt.com/c/9", "active": true },
            "frameId": 0
        }))
        .unwrap();

        assert_eq!(sender, tab(12, "https://chatgpt.com/c/9"));
    }
}
