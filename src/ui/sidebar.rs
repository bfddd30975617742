/// Sidebar panel listing saved conversations

use std::rc::Rc;

use log::{debug, error};
use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::bookmark::Bookmark;
use crate::browser;
use crate::config::ExtensionConfig;
use crate::protocol::Request;
use crate::ui::components::BookmarkList;
use crate::ui::state::{NoticeKind, SidebarAction, SidebarState};

#[derive(Properties, PartialEq)]
pub struct SidebarProps {
    pub config: Rc<ExtensionConfig>,
}

#[function_component(Sidebar)]
pub fn sidebar(props: &SidebarProps) -> Html {
    let state = use_reducer(SidebarState::default);

    // Load bookmarks on mount
    {
        let dispatcher = state.dispatcher();
        use_effect_with((), move |_| {
            spawn_local(load_bookmarks(dispatcher));
            || ()
        });
    }

    // Dismiss each notification after a delay
    {
        let dispatcher = state.dispatcher();
        let delay = props.config.notification_ms;
        let notice_id = state.notice.as_ref().map(|notice| notice.id);
        use_effect_with(notice_id, move |notice_id| {
            if let Some(id) = *notice_id {
                spawn_local(async move {
                    browser::sleep(delay).await;
                    dispatcher.dispatch(SidebarAction::Dismiss(id));
                });
            }
            || ()
        });
    }

    let on_refresh = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_| {
            spawn_local(load_bookmarks(dispatcher.clone()));
        })
    };

    let on_search_input = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(SidebarAction::Search(input.value()));
            }
        })
    };

    let on_clear_search = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_| dispatcher.dispatch(SidebarAction::ClearSearch))
    };

    let on_title_input = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(SidebarAction::NewTitleInput(input.value()));
            }
        })
    };

    let on_url_input = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(SidebarAction::NewUrlInput(input.value()));
            }
        })
    };

    let on_add = {
        let state = state.clone();
        Callback::from(move |_| match state.manual_draft() {
            Ok(draft) => {
                state.dispatch(SidebarAction::ClearForm);
                spawn_local(mutate(
                    state.dispatcher(),
                    Request::SaveBookmark(draft),
                    "Bookmark added successfully",
                    "Failed to add bookmark",
                ));
            }
            Err(message) => state.dispatch(SidebarAction::Notify(NoticeKind::Error, message.to_string())),
        })
    };

    let on_start_edit = {
        let dispatcher = state.dispatcher();
        Callback::from(move |(id, title): (String, String)| {
            dispatcher.dispatch(SidebarAction::StartEdit { id, title });
        })
    };

    let on_edit_input = {
        let dispatcher = state.dispatcher();
        Callback::from(move |value: String| dispatcher.dispatch(SidebarAction::EditInput(value)))
    };

    let on_save_edit = {
        let state = state.clone();
        Callback::from(move |_| {
            let pending = state.pending_edit();
            state.dispatch(SidebarAction::CancelEdit);
            if let Some((id, bookmark)) = pending {
                spawn_local(mutate(
                    state.dispatcher(),
                    Request::UpdateBookmark { id, bookmark },
                    "Bookmark updated successfully",
                    "Failed to update bookmark",
                ));
            }
        })
    };

    let on_cancel_edit = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_| dispatcher.dispatch(SidebarAction::CancelEdit))
    };

    let on_delete = {
        let dispatcher = state.dispatcher();
        Callback::from(move |id: String| {
            if !confirm("Are you sure you want to delete this bookmark?") {
                return;
            }
            spawn_local(mutate(
                dispatcher.clone(),
                Request::DeleteBookmark { id },
                "Bookmark deleted successfully",
                "Failed to delete bookmark",
            ));
        })
    };

    let filtered = state.filtered();

    html! {
        <div class="sidebar">
            <div class="sidebar-header">
                <h1 class="sidebar-title">{"📌 PinGPT"}</h1>
                <Button onclick={on_refresh} variant={ButtonVariant::Secondary} disabled={state.loading}>
                    {"🔄 Refresh"}
                </Button>
            </div>

            if let Some(notice) = &state.notice {
                <div class="notification">
                    <Alert
                        r#type={match notice.kind {
                            NoticeKind::Success => AlertType::Success,
                            NoticeKind::Error => AlertType::Danger,
                        }}
                        title={notice.message.clone()}
                        inline={true}
                    >
                    </Alert>
                </div>
            }

            // Search bar
            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search bookmarks..."
                    value={state.query.clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
                if !state.query.is_empty() {
                    <Button onclick={on_clear_search} variant={ButtonVariant::Plain}>
                        {"✕"}
                    </Button>
                }
            </div>

            // Manual entry
            <div class="add-form">
                <input
                    type="text"
                    placeholder="Title"
                    value={state.new_title.clone()}
                    oninput={on_title_input}
                    class="add-input"
                />
                <input
                    type="url"
                    placeholder="URL"
                    value={state.new_url.clone()}
                    oninput={on_url_input}
                    class="add-input"
                />
                <Button onclick={on_add} variant={ButtonVariant::Primary}>
                    {"➕ Add Bookmark"}
                </Button>
            </div>

            if state.loading {
                <div class="loading-text-center">
                    <Spinner />
                    <p class="loading-text">{"Loading bookmarks..."}</p>
                </div>
            } else if filtered.is_empty() {
                <div class="empty-state">
                    if state.query.trim().is_empty() {
                        <p>{"No bookmarks yet."}</p>
                        <p class="empty-state-hint">{"Use the 📌 button on a ChatGPT conversation to pin it."}</p>
                    } else {
                        <p>{"No bookmarks match your search."}</p>
                    }
                </div>
            } else {
                <BookmarkList
                    bookmarks={filtered}
                    editing={state.editing.clone()}
                    edit_value={state.edit_value.clone()}
                    on_start_edit={on_start_edit}
                    on_edit_input={on_edit_input}
                    on_save_edit={on_save_edit}
                    on_cancel_edit={on_cancel_edit}
                    on_delete={on_delete}
                />
            }

            <div class="footer">{state.stats()}</div>
        </div>
    }
}

// Helper functions

async fn load_bookmarks(dispatcher: UseReducerDispatcher<SidebarState>) {
    dispatcher.dispatch(SidebarAction::Loading);
    match browser::request::<Vec<Bookmark>>(&Request::GetBookmarks).await {
        Ok(bookmarks) => {
            debug!("Loaded {} bookmarks", bookmarks.len());
            dispatcher.dispatch(SidebarAction::Loaded(bookmarks));
        }
        Err(e) => {
            error!("Failed to load bookmarks: {}", e);
            dispatcher.dispatch(SidebarAction::LoadFailed(e));
        }
    }
}

/// Send a mutation to the hub, report the outcome, then reload the list.
async fn mutate(
    dispatcher: UseReducerDispatcher<SidebarState>,
    request: Request,
    success: &'static str,
    failure: &'static str,
) {
    let action = request.action();
    let notice = match browser::send_message(&request).await {
        Ok(reply) if reply.is_success() => (NoticeKind::Success, success.to_string()),
        Ok(reply) => {
            let reason = reply.message.unwrap_or_default();
            error!("{} failed: {}", action, reason);
            (NoticeKind::Error, format!("{}: {}", failure, reason))
        }
        Err(e) => {
            error!("{} failed: {}", action, e);
            (NoticeKind::Error, format!("{}: {}", failure, e))
        }
    };
    dispatcher.dispatch(SidebarAction::Notify(notice.0, notice.1));
    load_bookmarks(dispatcher).await;
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}
