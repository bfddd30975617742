/// Bookmark persistence over chrome.storage (or any key-value area)
use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bookmark::{generate_id, Bookmark, BookmarkDraft, SearchQuery};
use crate::error::BookmarkError;

/// Key the collection lives under
pub const DEFAULT_STORAGE_KEY: &str = "bookmarks";

/// A persisted key-value area holding JSON values.
///
/// Implemented by `ChromeStorage` in the extension and by [`MemoryStorage`]
/// natively. Calls suspend at the backend and are not mutually exclusive.
#[allow(async_fn_in_trait)]
pub trait StorageArea {
    async fn read(&self, key: &str) -> Result<Option<Value>, BookmarkError>;
    async fn write(&self, key: &str, value: Value) -> Result<(), BookmarkError>;
}

/// Root storage structure: the insertion-ordered list of stored records.
///
/// Records are kept as raw JSON. Entries that do not decode as a [`Bookmark`]
/// (older formats, hand-edited data) are hidden from reads but written back
/// untouched, so a bad record never takes the good ones down with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkCollection {
    records: Vec<Value>,
}

impl BookmarkCollection {
    pub fn new() -> Self {
        BookmarkCollection {
            records: Vec::new(),
        }
    }

    /// Number of stored records, including undecodable ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record that decodes as a bookmark, in stored order.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record.clone()) {
                Ok(bookmark) => Some(bookmark),
                Err(e) => {
                    warn!("Skipping stored record {}: {}", index, e);
                    None
                }
            })
            .collect()
    }

    pub fn add_bookmark(&mut self, bookmark: &Bookmark) -> Result<(), BookmarkError> {
        self.records.push(serde_json::to_value(bookmark)?);
        Ok(())
    }

    pub fn remove_bookmark(&mut self, bookmark_id: &str) -> bool {
        let original_len = self.records.len();
        self.records.retain(|record| record_id(record) != Some(bookmark_id));
        self.records.len() < original_len
    }

    pub fn get_bookmark(&self, bookmark_id: &str) -> Option<Bookmark> {
        self.records
            .iter()
            .filter(|record| record_id(record) == Some(bookmark_id))
            .find_map(|record| serde_json::from_value(record.clone()).ok())
    }

    /// Merge `draft` into the decodable record with `bookmark_id`. Returns
    /// whether such a record exists.
    pub fn update_bookmark(
        &mut self,
        bookmark_id: &str,
        draft: BookmarkDraft,
        now: DateTime<Utc>,
    ) -> Result<bool, BookmarkError> {
        let found = self.records.iter_mut().find_map(|record| {
            if record_id(record) != Some(bookmark_id) {
                return None;
            }
            let bookmark = serde_json::from_value::<Bookmark>(record.clone()).ok()?;
            Some((record, bookmark))
        });

        let Some((record, mut bookmark)) = found else {
            return Ok(false);
        };
        bookmark.merge(draft, now);
        *record = serde_json::to_value(&bookmark)?;
        Ok(true)
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<Bookmark> {
        self.bookmarks()
            .into_iter()
            .filter(|b| query.matches(b))
            .collect()
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// CRUD façade over a [`StorageArea`].
///
/// Every operation reads the whole collection, changes it and writes it back.
/// Two overlapping writes race and the last one wins.
pub struct BookmarkStore<S> {
    area: S,
    key: String,
    clock: fn() -> DateTime<Utc>,
}

impl<S: StorageArea> BookmarkStore<S> {
    pub fn new(area: S) -> Self {
        Self::with_key(area, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(area: S, key: impl Into<String>) -> Self {
        BookmarkStore {
            area,
            key: key.into(),
            clock: Utc::now,
        }
    }

    /// Replace the time source used for `timestamp` and `updatedAt`.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn area(&self) -> &S {
        &self.area
    }

    /// Validate and append a new bookmark, returning the stored record.
    pub async fn save_bookmark(&self, draft: BookmarkDraft) -> Result<Bookmark, BookmarkError> {
        draft.validate()?;

        let now = (self.clock)();
        let bookmark = Bookmark::from_draft(draft, generate_id(now), now);

        let mut collection = self.load().await?;
        collection.add_bookmark(&bookmark)?;
        self.persist(&collection).await?;

        info!("Bookmark saved: {} ({})", bookmark.title, bookmark.id);
        Ok(bookmark)
    }

    /// All bookmarks in stored order. Never fails: a missing, corrupt or
    /// unreadable store yields an empty list.
    pub async fn get_bookmarks(&self) -> Vec<Bookmark> {
        self.load_or_empty().await.bookmarks()
    }

    /// Remove the bookmark with `bookmark_id`; unknown IDs are a no-op.
    pub async fn delete_bookmark(&self, bookmark_id: &str) -> Result<(), BookmarkError> {
        let mut collection = self.load().await?;
        if !collection.remove_bookmark(bookmark_id) {
            debug!("Delete of unknown bookmark {}", bookmark_id);
        }
        self.persist(&collection).await?;

        info!("Bookmark deleted: {}", bookmark_id);
        Ok(())
    }

    /// Merge `draft` into the bookmark with `bookmark_id` and stamp `updatedAt`.
    pub async fn update_bookmark(&self, bookmark_id: &str, draft: BookmarkDraft) -> Result<(), BookmarkError> {
        draft.validate()?;

        let mut collection = self.load().await?;
        if !collection.update_bookmark(bookmark_id, draft, (self.clock)())? {
            return Err(BookmarkError::NotFound(bookmark_id.to_string()));
        }
        self.persist(&collection).await?;

        info!("Bookmark updated: {}", bookmark_id);
        Ok(())
    }

    pub async fn search_bookmarks(&self, query: &str) -> Vec<Bookmark> {
        self.load_or_empty().await.search(&SearchQuery::new(query))
    }

    /// Stored records. Fails when the area cannot be read or the value under
    /// the key is not a list, so writes never replace data they did not see.
    async fn load(&self) -> Result<BookmarkCollection, BookmarkError> {
        match self.area.read(&self.key).await? {
            None | Some(Value::Null) => Ok(BookmarkCollection::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                BookmarkError::Storage(format!("Stored bookmarks under '{}' are not a list: {}", self.key, e))
            }),
        }
    }

    async fn load_or_empty(&self) -> BookmarkCollection {
        self.load().await.unwrap_or_else(|e| {
            warn!("Error retrieving bookmarks: {}", e);
            BookmarkCollection::new()
        })
    }

    async fn persist(&self, collection: &BookmarkCollection) -> Result<(), BookmarkError> {
        let value = serde_json::to_value(collection)?;
        self.area.write(&self.key, value).await
    }
}

/// In-process storage area
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-populated key, e.g. fixture data.
    pub fn with_entry(key: &str, value: Value) -> Self {
        let storage = Self::new();
        storage.entries.borrow_mut().insert(key.to_string(), value);
        storage
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }
}

impl StorageArea for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Value>, BookmarkError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), BookmarkError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }
}

impl<T: StorageArea> StorageArea for &T {
    async fn read(&self, key: &str) -> Result<Option<Value>, BookmarkError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), BookmarkError> {
        (**self).write(key, value).await
    }
}
