//! Conversation extraction from the ChatGPT page.
//!
//! Works on serialized HTML so the same code runs in the content script (fed
//! with `document.documentElement.outerHTML`) and in native tests. Extraction
//! is best-effort: missing elements degrade to fallbacks, never to errors.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::bookmark::{ellipsize, generate_id, BookmarkDraft, ChatMessage, Role};
use crate::config::ExtractorConfig;

static CONVERSATION_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"/c/([a-zA-Z0-9-]+)").ok());

/// Everything scraped from one conversation page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub title: String,
    pub url: String,
    pub conversation_id: String,
    /// Short summary derived from the first user message.
    pub content: String,
    pub messages: Vec<ChatMessage>,
    pub message_count: usize,
    pub last_updated: DateTime<Utc>,
}

impl ConversationSnapshot {
    pub fn into_draft(self) -> BookmarkDraft {
        BookmarkDraft {
            title: self.title,
            url: self.url,
            content: Some(self.content),
            conversation_id: Some(self.conversation_id),
            messages: Some(self.messages),
            message_count: Some(self.message_count),
        }
    }
}

/// Scrape `html` (the page at `url`) into a snapshot stamped with `now`.
pub fn extract_conversation(
    html: &str,
    url: &str,
    config: &ExtractorConfig,
    now: DateTime<Utc>,
) -> ConversationSnapshot {
    let document = Html::parse_document(html);

    let title = extract_title(&document, config);
    let messages = extract_messages(&document, config, now);
    let content = summarize(&messages, config.summary_max_chars);
    let conversation_id = conversation_id_from_url(url).unwrap_or_else(|| generate_id(now));

    debug!("Extracted '{}' with {} messages", title, messages.len());

    ConversationSnapshot {
        title,
        url: url.to_string(),
        conversation_id,
        content,
        message_count: messages.len(),
        messages,
        last_updated: now,
    }
}

fn extract_title(document: &Html, config: &ExtractorConfig) -> String {
    for selector in parse_selectors(&config.title_selectors) {
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(&element);
            if !text.is_empty() {
                return text;
            }
        }
    }

    // Fallback: the document title without the site suffix
    let page_title = parse_selector("title")
        .and_then(|selector| document.select(&selector).next().map(|el| element_text(&el)))
        .unwrap_or_default();
    // The title text is already trimmed, so the suffix has to be as well
    let suffix = config.page_title_suffix.trim();
    let stripped = page_title.strip_suffix(suffix).unwrap_or(&page_title).trim();

    if stripped.is_empty() {
        config.fallback_title.clone()
    } else {
        stripped.to_string()
    }
}

fn extract_messages(document: &Html, config: &ExtractorConfig, now: DateTime<Utc>) -> Vec<ChatMessage> {
    let (Some(user), Some(assistant)) = (
        parse_selector(&config.user_selector),
        parse_selector(&config.assistant_selector),
    ) else {
        return Vec::new();
    };

    for selector in parse_selectors(&config.message_selectors) {
        let messages: Vec<ChatMessage> = document
            .select(&selector)
            .filter_map(|element| message_from_element(&element, &user, &assistant, now))
            .collect();

        if !messages.is_empty() {
            return messages;
        }
    }

    Vec::new()
}

fn message_from_element(
    element: &ElementRef,
    user: &Selector,
    assistant: &Selector,
    now: DateTime<Utc>,
) -> Option<ChatMessage> {
    let (role, body) = if let Some(body) = element.select(user).next() {
        (Role::User, body)
    } else {
        (Role::Assistant, element.select(assistant).next()?)
    };

    Some(ChatMessage {
        role,
        content: element_text(&body),
        timestamp: now,
    })
}

/// Summary: first user message, shortened to `max_chars`.
pub fn summarize(messages: &[ChatMessage], max_chars: usize) -> String {
    if messages.is_empty() {
        return "Empty conversation".to_string();
    }

    match messages.iter().find(|m| m.role == Role::User) {
        Some(first) => ellipsize(&first.content, max_chars),
        None => "ChatGPT conversation".to_string(),
    }
}

/// The `/c/<id>` segment of a conversation URL.
pub fn conversation_id_from_url(url: &str) -> Option<String> {
    CONVERSATION_ID
        .as_ref()?
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Skipping invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

fn parse_selectors(selectors: &[String]) -> Vec<Selector> {
    selectors.iter().filter_map(|s| parse_selector(s)).collect()
}
