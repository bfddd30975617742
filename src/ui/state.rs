//! Sidebar state, kept in a component-local reducer.

use std::rc::Rc;

use yew::Reducible;

use crate::bookmark::{Bookmark, BookmarkDraft, SearchQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient notification; `id` lets a stale timer leave a newer notice alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u32,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarState {
    pub bookmarks: Vec<Bookmark>,
    pub loading: bool,
    pub query: String,
    /// ID of the bookmark whose title is being edited
    pub editing: Option<String>,
    pub edit_value: String,
    pub new_title: String,
    pub new_url: String,
    pub notice: Option<Notice>,
    next_notice_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    Loading,
    Loaded(Vec<Bookmark>),
    LoadFailed(String),
    Search(String),
    ClearSearch,
    StartEdit { id: String, title: String },
    EditInput(String),
    CancelEdit,
    NewTitleInput(String),
    NewUrlInput(String),
    ClearForm,
    Notify(NoticeKind, String),
    Dismiss(u32),
}

impl SidebarState {
    pub fn apply(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::Loading => self.loading = true,
            SidebarAction::Loaded(bookmarks) => {
                self.bookmarks = bookmarks;
                self.loading = false;
                // The edited bookmark may be gone after a reload
                if let Some(id) = &self.editing {
                    if !self.bookmarks.iter().any(|b| &b.id == id) {
                        self.editing = None;
                    }
                }
            }
            SidebarAction::LoadFailed(message) => {
                self.loading = false;
                self.notify(NoticeKind::Error, format!("Failed to load bookmarks: {}", message));
            }
            SidebarAction::Search(query) => self.query = query,
            SidebarAction::ClearSearch => self.query.clear(),
            SidebarAction::StartEdit { id, title } => {
                self.editing = Some(id);
                self.edit_value = title;
            }
            SidebarAction::EditInput(value) => self.edit_value = value,
            SidebarAction::CancelEdit => {
                self.editing = None;
                self.edit_value.clear();
            }
            SidebarAction::NewTitleInput(value) => self.new_title = value,
            SidebarAction::NewUrlInput(value) => self.new_url = value,
            SidebarAction::ClearForm => {
                self.new_title.clear();
                self.new_url.clear();
            }
            SidebarAction::Notify(kind, message) => self.notify(kind, message),
            SidebarAction::Dismiss(id) => {
                if self.notice.as_ref().is_some_and(|notice| notice.id == id) {
                    self.notice = None;
                }
            }
        }
    }

    fn notify(&mut self, kind: NoticeKind, message: String) {
        self.next_notice_id = self.next_notice_id.wrapping_add(1);
        self.notice = Some(Notice {
            id: self.next_notice_id,
            kind,
            message,
        });
    }

    /// Bookmarks matching the current query, in stored order.
    pub fn filtered(&self) -> Vec<Bookmark> {
        let query = SearchQuery::new(&self.query);
        self.bookmarks
            .iter()
            .filter(|bookmark| query.matches(bookmark))
            .cloned()
            .collect()
    }

    /// Draft from the manual-entry form, or the message to show when a field
    /// is blank.
    pub fn manual_draft(&self) -> Result<BookmarkDraft, &'static str> {
        let title = self.new_title.trim();
        let url = self.new_url.trim();
        if title.is_empty() || url.is_empty() {
            return Err("Please enter both title and URL");
        }
        Ok(BookmarkDraft::new(title, url).with_content("Manually added bookmark"))
    }

    /// The update to send for the title being edited. `None` when nothing is
    /// being edited or the title is blank or unchanged.
    pub fn pending_edit(&self) -> Option<(String, BookmarkDraft)> {
        let id = self.editing.as_ref()?;
        let bookmark = self.bookmarks.iter().find(|b| &b.id == id)?;
        let title = self.edit_value.trim();
        if title.is_empty() || title == bookmark.title {
            return None;
        }
        Some((id.clone(), BookmarkDraft::from(bookmark).with_title(title)))
    }

    pub fn stats(&self) -> String {
        format!("Total bookmarks: {}", self.bookmarks.len())
    }
}

impl Reducible for SidebarState {
    type Action = SidebarAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        Rc::new(next)
    }
}
