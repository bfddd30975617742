//! Error types shared by the storage module and the background hub.

use thiserror::Error;

/// Errors raised by bookmark storage operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// The candidate bookmark failed validation.
    #[error("Invalid bookmark data: {0}")]
    Validation(String),

    /// No bookmark has the given ID.
    #[error("Bookmark not found: {0}")]
    NotFound(String),

    /// The storage backend rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The collection could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while routing a message through the hub.
#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),

    #[error("Not a ChatGPT page")]
    NotChatPage,

    /// The request needs a sender tab but arrived from an extension page.
    #[error("No sender tab for {0}")]
    MissingTab(&'static str),

    #[error("Failed to extract conversation content: {0}")]
    Extraction(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid request for {action}: {reason}")]
    InvalidRequest { action: String, reason: String },

    /// Relaying a request to a tab failed.
    #[error("Messaging failed: {0}")]
    Messaging(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
