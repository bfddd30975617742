//! Extension settings.
//!
//! Every field has a default; overrides can be stored as JSON under
//! [`SETTINGS_KEY`] in the same storage area as the bookmarks.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::storage::{StorageArea, DEFAULT_STORAGE_KEY};

/// Storage key holding user overrides.
pub const SETTINGS_KEY: &str = "pingptSettings";

/// Which chrome.storage area backs the extension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageAreaKind {
    /// Synced across the user's browsers (small quota).
    #[default]
    Sync,
    /// Local to this browser profile.
    Local,
}

impl StorageAreaKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Local => "local",
        }
    }
}

/// Top-level configuration shared by background, content script and sidebar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionConfig {
    /// Key the bookmark collection is stored under.
    pub storage_key: String,
    pub storage_area: StorageAreaKind,
    /// Hosts on which conversation extraction is allowed.
    pub chat_hosts: Vec<String>,
    /// How long sidebar notifications stay visible.
    pub notification_ms: u32,
    /// How long the pin button shows its saved/error state.
    pub button_reset_ms: u32,
    pub extractor: ExtractorConfig,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_area: StorageAreaKind::Sync,
            chat_hosts: vec!["chat.openai.com".to_string(), "chatgpt.com".to_string()],
            notification_ms: 3000,
            button_reset_ms: 2000,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl ExtensionConfig {
    /// Parse overrides; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load overrides from `area`, falling back to defaults when the key is
    /// absent, unreadable or malformed.
    pub async fn load<S: StorageArea>(area: &S) -> Self {
        match area.read(SETTINGS_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("Ignoring malformed settings: {}", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!("Could not read settings: {}", e);
                Self::default()
            }
        }
    }

    /// Whether `host` is one of the ChatGPT hosts (or a subdomain of one).
    pub fn is_chat_host(&self, host: &str) -> bool {
        self.chat_hosts
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }
}

/// Selectors and limits for scraping the conversation page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// Tried in order; the first with non-empty text names the conversation.
    pub title_selectors: Vec<String>,
    /// Tried in order; the first yielding at least one message wins, so a
    /// single-turn conversation is captured too.
    pub message_selectors: Vec<String>,
    pub user_selector: String,
    pub assistant_selector: String,
    /// Where the pin button is appended, first existing element wins.
    pub mount_selectors: Vec<String>,
    /// Stripped from the document title when it is used as fallback.
    pub page_title_suffix: String,
    pub fallback_title: String,
    pub summary_max_chars: usize,
    pub button_id: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            title_selectors: to_strings(&[
                r#"h1[data-testid="conversation-title"]"#,
                ".conversation-title",
                "header h1",
                r#"[data-qa="chat-title"]"#,
                ".chat-title",
            ]),
            message_selectors: to_strings(&[
                r#"[data-testid^="conversation-turn"]"#,
                ".message",
                r#"[role="presentation"]"#,
                ".group",
            ]),
            user_selector: r#"[data-message-author-role="user"]"#.to_string(),
            assistant_selector: r#"[data-message-author-role="assistant"]"#.to_string(),
            mount_selectors: to_strings(&["main", r#"[role="main"]"#, ".chat-container", "body"]),
            page_title_suffix: " - ChatGPT".to_string(),
            fallback_title: "ChatGPT Conversation".to_string(),
            summary_max_chars: 100,
            button_id: "pingpt-bookmark-btn".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ExtensionConfig::default();

        assert_eq!(config.storage_key, "bookmarks");
        assert_eq!(config.storage_area, StorageAreaKind::Sync);
        assert_eq!(config.extractor.summary_max_chars, 100);
        assert_eq!(config.extractor.mount_selectors.last().map(String::as_str), Some("body"));
    }

    #[test]
    fn test_partial_override_from_json() {
        let config = ExtensionConfig::from_json(r#"{"storageArea":"local","extractor":{"summaryMaxChars":40}}"#).unwrap();

        assert_eq!(config.storage_area, StorageAreaKind::Local);
        assert_eq!(config.extractor.summary_max_chars, 40);
        assert_eq!(config.extractor.fallback_title, "ChatGPT Conversation");
        assert_eq!(config.button_reset_ms, 2000);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let empty = MemoryStorage::new();
        assert_eq!(block_on(ExtensionConfig::load(&empty)), ExtensionConfig::default());

        let malformed = MemoryStorage::with_entry(SETTINGS_KEY, json!({ "notificationMs": "soon" }));
        assert_eq!(block_on(ExtensionConfig::load(&malformed)), ExtensionConfig::default());
    }

    #[test]
    fn test_load_reads_overrides() {
        let area = MemoryStorage::with_entry(SETTINGS_KEY, json!({ "notificationMs": 5000 }));

        let config = block_on(ExtensionConfig::load(&area));

        assert_eq!(config.notification_ms, 5000);
        assert_eq!(config.storage_key, "bookmarks");
    }

    #[test]
    fn test_is_chat_host() {
        let config = ExtensionConfig::default();

        assert!(config.is_chat_host("chat.openai.com"));
        assert!(config.is_chat_host("chatgpt.com"));
        assert!(config.is_chat_host("www.chatgpt.com"));
        assert!(!config.is_chat_host("notchatgpt.com"));
        assert!(!config.is_chat_host("example.com"));
    }

    #[test]
    fn test_storage_area_names() {
        assert_eq!(StorageAreaKind::Sync.as_str(), "sync");
        assert_eq!(StorageAreaKind::Local.as_str(), "local");
    }
}
