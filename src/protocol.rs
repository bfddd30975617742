/// Request/reply messages exchanged over chrome.runtime messaging
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bookmark::BookmarkDraft;
use crate::error::HubError;

/// Every action understood by the hub or the content script.
///
/// Wire form: `{ "action": "...", "data": {...} }`, `data` omitted for
/// actions without payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum Request {
    SaveBookmark(BookmarkDraft),
    GetBookmarks,
    DeleteBookmark {
        id: String,
    },
    UpdateBookmark {
        id: String,
        bookmark: BookmarkDraft,
    },
    SearchBookmarks {
        query: String,
    },
    #[serde(rename = "extractChatGPTConversation")]
    ExtractChatGptConversation,
    ExtractConversation,
    InjectBookmarkButton,
}

impl Request {
    pub const ACTIONS: [&'static str; 8] = [
        "saveBookmark",
        "getBookmarks",
        "deleteBookmark",
        "updateBookmark",
        "searchBookmarks",
        "extractChatGPTConversation",
        "extractConversation",
        "injectBookmarkButton",
    ];

    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveBookmark(_) => "saveBookmark",
            Request::GetBookmarks => "getBookmarks",
            Request::DeleteBookmark { .. } => "deleteBookmark",
            Request::UpdateBookmark { .. } => "updateBookmark",
            Request::SearchBookmarks { .. } => "searchBookmarks",
            Request::ExtractChatGptConversation => "extractChatGPTConversation",
            Request::ExtractConversation => "extractConversation",
            Request::InjectBookmarkButton => "injectBookmarkButton",
        }
    }

    /// Decode a raw message, telling unknown actions apart from bad payloads.
    pub fn from_value(raw: Value) -> Result<Request, HubError> {
        let action = raw
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if !Self::ACTIONS.contains(&action.as_str()) {
            return Err(HubError::UnknownAction(action));
        }

        serde_json::from_value(raw).map_err(|e| HubError::InvalidRequest {
            action,
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Reply envelope: `{ status, data?, message? }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn success() -> Response {
        Response {
            status: Status::Success,
            data: None,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Response {
        Response {
            message: Some(message.into()),
            ..Response::success()
        }
    }

    pub fn with_data<T: Serialize>(data: &T) -> Result<Response, serde_json::Error> {
        Ok(Response {
            data: Some(serde_json::to_value(data)?),
            ..Response::success()
        })
    }

    pub fn error(message: impl Into<String>) -> Response {
        Response {
            status: Status::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Turn an error reply into `Err(message)` and decode `data` otherwise.
    /// Missing data decodes as JSON `null`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, String> {
        if !self.is_success() {
            return Err(self.message.unwrap_or_else(|| "Unknown error".to_string()));
        }
        serde_json::from_value(self.data.unwrap_or(Value::Null))
            .map_err(|e| format!("Unexpected reply data: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::Bookmark;
    use serde_json::json;

    #[test]
    fn test_unit_actions_have_no_data() {
        let json = serde_json::to_value(Request::GetBookmarks).unwrap();
        assert_eq!(json, json!({ "action": "getBookmarks" }));

        let request: Request = serde_json::from_value(json!({ "action": "injectBookmarkButton" })).unwrap();
        assert_eq!(request, Request::InjectBookmarkButton);
    }

    #[test]
    fn test_update_request_wire_format() {
        let raw = json!({
            "action": "updateBookmark",
            "data": {
                "id": "abc",
                "bookmark": { "id": "abc", "title": "New", "url": "https://chatgpt.com/c/1", "timestamp": "2023-01-01T00:00:00Z" }
            }
        });

        let request = Request::from_value(raw).unwrap();

        assert_eq!(
            request,
            Request::UpdateBookmark {
                id: "abc".to_string(),
                bookmark: BookmarkDraft::new("New", "https://chatgpt.com/c/1"),
            }
        );
    }

    #[test]
    fn test_extract_chatgpt_action_name() {
        let request = Request::from_value(json!({ "action": "extractChatGPTConversation" })).unwrap();

        assert_eq!(request, Request::ExtractChatGptConversation);
        assert_eq!(request.action(), "extractChatGPTConversation");
    }

    #[test]
    fn test_actions_table_matches_variants() {
        let samples = vec![
            Request::SaveBookmark(BookmarkDraft::new("Chat", "https://chatgpt.com/c/1")),
            Request::GetBookmarks,
            Request::DeleteBookmark { id: "1".to_string() },
            Request::UpdateBookmark {
                id: "1".to_string(),
                bookmark: BookmarkDraft::new("Chat", "https://chatgpt.com/c/1"),
            },
            Request::SearchBookmarks { query: "rust".to_string() },
            Request::ExtractChatGptConversation,
            Request::ExtractConversation,
            Request::InjectBookmarkButton,
        ];

        let names: Vec<&str> = samples.iter().map(Request::action).collect();
        assert_eq!(names, Request::ACTIONS);

        for sample in samples {
            let raw = serde_json::to_value(&sample).unwrap();
            assert_eq!(raw["action"], sample.action());
            assert_eq!(Request::from_value(raw).unwrap(), sample);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = Request::from_value(json!({ "action": "launchRockets" })).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action: launchRockets");

        let err = Request::from_value(json!({ "data": {} })).unwrap_err();
        assert!(matches!(err, HubError::UnknownAction(_)));
    }

    #[test]
    fn test_known_action_with_bad_payload() {
        let err = Request::from_value(json!({ "action": "deleteBookmark", "data": {} })).unwrap_err();

        match err {
            HubError::InvalidRequest { action, .. } => assert_eq!(action, "deleteBookmark"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(
            serde_json::to_value(Response::with_message("Bookmark saved successfully")).unwrap(),
            json!({ "status": "success", "message": "Bookmark saved successfully" })
        );
        assert_eq!(
            serde_json::to_value(Response::error("boom")).unwrap(),
            json!({ "status": "error", "message": "boom" })
        );
    }

    #[test]
    fn test_into_data() {
        let reply = Response::with_data(&Vec::<Bookmark>::new()).unwrap();
        let bookmarks: Vec<Bookmark> = reply.into_data().unwrap();
        assert!(bookmarks.is_empty());

        assert!(Response::success().into_data::<()>().is_ok());

        let err = Response::error("Bookmark not found: x").into_data::<()>().unwrap_err();
        assert_eq!(err, "Bookmark not found: x");
    }
}
