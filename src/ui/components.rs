/// Bookmark cards shown in the sidebar list

use patternfly_yew::prelude::{Button, ButtonVariant};
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::bookmark::{ellipsize, Bookmark};

const PREVIEW_CHARS: usize = 100;

#[derive(Properties, PartialEq)]
pub struct BookmarkCardProps {
    pub bookmark: Bookmark,
    pub is_editing: bool,
    pub edit_value: String,
    pub on_start_edit: Callback<(String, String)>,
    pub on_edit_input: Callback<String>,
    pub on_save_edit: Callback<()>,
    pub on_cancel_edit: Callback<()>,
    pub on_delete: Callback<String>,
}

#[function_component(BookmarkCard)]
pub fn bookmark_card(props: &BookmarkCardProps) -> Html {
    let bookmark = &props.bookmark;

    let preview = ellipsize(bookmark.content.as_deref().unwrap_or(&bookmark.title), PREVIEW_CHARS);
    let date = bookmark.timestamp.format("%Y-%m-%d").to_string();
    let message_count = bookmark.message_count.filter(|count| *count > 0);

    let on_edit_input = props.on_edit_input.reform(|e: InputEvent| {
        e.target_dyn_into::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default()
    });

    // Enter saves, Escape cancels
    let on_edit_key = {
        let on_save = props.on_save_edit.clone();
        let on_cancel = props.on_cancel_edit.clone();
        Callback::from(move |e: KeyboardEvent| match e.key().as_str() {
            "Enter" => on_save.emit(()),
            "Escape" => on_cancel.emit(()),
            _ => {}
        })
    };

    html! {
        <div class="bookmark-card">
            <div class="bookmark-header">
                if props.is_editing {
                    <div class="bookmark-title-edit-mode">
                        <input
                            type="text"
                            value={props.edit_value.clone()}
                            oninput={on_edit_input}
                            onkeydown={on_edit_key}
                            class="bookmark-title-input"
                        />
                        <Button onclick={props.on_save_edit.reform(|_| ())}>
                            {"✓"}
                        </Button>
                        <Button
                            onclick={props.on_cancel_edit.reform(|_| ())}
                            variant={ButtonVariant::Secondary}
                        >
                            {"✗"}
                        </Button>
                    </div>
                } else {
                    <h3 class="bookmark-title" title={bookmark.title.clone()}>
                        {&bookmark.title}
                    </h3>
                    <div class="bookmark-actions">
                        <Button
                            onclick={props.on_start_edit.reform({
                                let id = bookmark.id.clone();
                                let title = bookmark.title.clone();
                                move |_| (id.clone(), title.clone())
                            })}
                            variant={ButtonVariant::Plain}
                        >
                            {"✏️"}
                        </Button>
                        <Button
                            onclick={props.on_delete.reform({
                                let id = bookmark.id.clone();
                                move |_| id.clone()
                            })}
                            variant={ButtonVariant::Danger}
                        >
                            {"🗑️"}
                        </Button>
                    </div>
                }
            </div>

            <p class="bookmark-preview">{preview}</p>

            <div class="bookmark-meta">
                <span class="bookmark-date">{date}</span>
                if let Some(count) = message_count {
                    <span class="bookmark-messages">{format!("{} messages", count)}</span>
                }
            </div>

            <a
                class="bookmark-link"
                href={bookmark.url.clone()}
                target="_blank"
                rel="noopener noreferrer"
            >
                {"Open conversation"}
            </a>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct BookmarkListProps {
    pub bookmarks: Vec<Bookmark>,
    /// ID of the bookmark whose title is being edited
    pub editing: Option<String>,
    pub edit_value: String,
    pub on_start_edit: Callback<(String, String)>,
    pub on_edit_input: Callback<String>,
    pub on_save_edit: Callback<()>,
    pub on_cancel_edit: Callback<()>,
    pub on_delete: Callback<String>,
}

#[function_component(BookmarkList)]
pub fn bookmark_list(props: &BookmarkListProps) -> Html {
    html! {
        <div class="bookmarks-list">
            {for props.bookmarks.iter().map(|bookmark| {
                let key = bookmark.id.clone();
                let is_editing = props.editing.as_ref() == Some(&bookmark.id);
                html! {
                    <BookmarkCard
                        key={key}
                        bookmark={bookmark.clone()}
                        is_editing={is_editing}
                        edit_value={props.edit_value.clone()}
                        on_start_edit={props.on_start_edit.clone()}
                        on_edit_input={props.on_edit_input.clone()}
                        on_save_edit={props.on_save_edit.clone()}
                        on_cancel_edit={props.on_cancel_edit.clone()}
                        on_delete={props.on_delete.clone()}
                    />
                }
            })}
        </div>
    }
}
