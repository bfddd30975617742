/// Data structures for PinGPT bookmarks
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::BookmarkError;

/// Author of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message scraped from a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A saved conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Candidate bookmark as sent by the content script or the sidebar.
///
/// Used both for creation and as the patch of an update. A missing title or
/// URL decodes as an empty string so it is reported by [`validate`] rather
/// than as a decoding failure. Unknown fields such as `id` are ignored.
///
/// [`validate`]: BookmarkDraft::validate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

impl BookmarkDraft {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> BookmarkDraft {
        BookmarkDraft {
            title: title.into(),
            url: url.into(),
            ..BookmarkDraft::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> BookmarkDraft {
        self.content = Some(content.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> BookmarkDraft {
        self.title = title.into();
        self
    }

    /// Title and URL must be non-blank and the URL must be an absolute
    /// `http` or `https` URL.
    pub fn validate(&self) -> Result<(), BookmarkError> {
        if self.title.trim().is_empty() {
            return Err(BookmarkError::Validation("missing title".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(BookmarkError::Validation("missing url".to_string()));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| BookmarkError::Validation(format!("invalid url '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BookmarkError::Validation(format!(
                "unsupported url scheme '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

impl From<&Bookmark> for BookmarkDraft {
    fn from(bookmark: &Bookmark) -> BookmarkDraft {
        BookmarkDraft {
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            content: bookmark.content.clone(),
            conversation_id: bookmark.conversation_id.clone(),
            messages: bookmark.messages.clone(),
            message_count: bookmark.message_count,
        }
    }
}

impl Bookmark {
    /// Build a new record from an already validated draft
    pub fn from_draft(draft: BookmarkDraft, id: String, now: DateTime<Utc>) -> Bookmark {
        Bookmark {
            id,
            title: draft.title,
            url: draft.url,
            content: draft.content,
            conversation_id: draft.conversation_id,
            messages: draft.messages,
            message_count: draft.message_count,
            timestamp: now,
            updated_at: None,
        }
    }

    /// Shallow merge: title and URL are replaced, optional fields only when
    /// the draft carries them. `id` and `timestamp` never change.
    pub fn merge(&mut self, draft: BookmarkDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.url = draft.url;
        if draft.content.is_some() {
            self.content = draft.content;
        }
        if draft.conversation_id.is_some() {
            self.conversation_id = draft.conversation_id;
        }
        if draft.messages.is_some() {
            self.messages = draft.messages;
        }
        if draft.message_count.is_some() {
            self.message_count = draft.message_count;
        }
        self.updated_at = Some(now);
    }
}

/// Case-insensitive substring query over title, URL and content.
///
/// The same query type backs the storage search and the sidebar filter, so a
/// blank query matches every bookmark in both. A non-blank query is matched
/// as typed, surrounding whitespace included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> SearchQuery {
        SearchQuery {
            needle: raw.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.trim().is_empty()
    }

    pub fn matches(&self, bookmark: &Bookmark) -> bool {
        self.is_empty()
            || bookmark.title.to_lowercase().contains(&self.needle)
            || bookmark.url.to_lowercase().contains(&self.needle)
            || bookmark
                .content
                .as_deref()
                .is_some_and(|content| content.to_lowercase().contains(&self.needle))
    }
}

/// Generate a bookmark ID: base-36 millisecond timestamp followed by nine
/// random alphanumerics.
pub fn generate_id(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", to_base36(millis), &suffix[..9])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Shorten `text` to at most `max_chars` characters, ending in "..." when cut
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
