//! HTML rendering for the browser UI.
//!
//! Fragments are swapped into the page by htmx; every control carries the
//! task id in its request path so the matching controller operation runs.

use anyhow::Result;
use std::fmt::Write;

use super::controller::{DELETE_PROMPT, TaskView, UiState};
use super::storage::LocalStorage;
use crate::types::{Filter, Task, User};

/// Storage key for the task panel state.
pub const PANEL_COLLAPSED_KEY: &str = "taskSectionCollapsed";

/// Placeholder shown when the (filtered) list is empty.
pub const EMPTY_LIST_MESSAGE: &str = "No tasks added";

/// Element id fragments are swapped into.
pub const LIST_CONTAINER_ID: &str = "task-list-container";

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// [`TaskView`] producing an HTML fragment.
#[derive(Debug, Default)]
pub struct HtmlView {
    html: Option<String>,
    errors: Vec<String>,
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last rendered fragment, if anything was rendered.
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_html(self) -> Option<String> {
        self.html
    }
}

impl TaskView for HtmlView {
    fn render_tasks(&mut self, state: &UiState, tasks: &[Task]) {
        self.html = Some(render_task_list(state, tasks));
    }

    fn show_error(&mut self, context: &str, message: &str) {
        // No error UI; the controller has already logged it.
        self.errors.push(format!("{}: {}", context, message));
    }
}

/// Filter bar plus the list (or the empty placeholder).
pub fn render_task_list(state: &UiState, tasks: &[Task]) -> String {
    let mut html = render_filters(state.filter);

    if tasks.is_empty() {
        html.push_str(&format!(
            r#"<div class="empty-list"><p class="text-muted">{}</p></div>"#,
            EMPTY_LIST_MESSAGE
        ));
        return html;
    }

    html.push_str(r#"<ul id="tasks" class="task-list">"#);
    for task in tasks {
        html.push_str(&render_task_item(task));
    }
    html.push_str("</ul>");
    html
}

fn render_filters(active: Filter) -> String {
    let mut html = String::from(r#"<div class="task-filters btn-group">"#);
    for filter in Filter::ALL {
        let class = if filter == active {
            "btn btn-outline-primary active"
        } else {
            "btn btn-outline-primary"
        };
        let _ = write!(
            html,
            r##"<button class="{class}" data-filter="{value}" hx-post="/ui/filter" hx-vals='{{"filter": "{value}"}}' hx-target="#{target}" hx-swap="innerHTML">{label}</button>"##,
            class = class,
            value = filter.as_str(),
            target = LIST_CONTAINER_ID,
            label = filter.label(),
        );
    }
    html.push_str("</div>");
    html
}

/// One `<li>`: checkbox bound to the status route, delete button bound to the
/// delete route behind a confirmation.
pub fn render_task_item(task: &Task) -> String {
    let completed = task.status.is_completed();
    let next_status = task.status.toggled();

    format!(
        r##"<li class="task-item" data-id="{id}">
    <label class="task-check">
        <input class="task-checkbox" type="checkbox"{checked} hx-post="/ui/tasks/{id}/status" hx-vals='{{"status": "{next}"}}' hx-target="#{target}" hx-swap="innerHTML">
        <span class="task-title{title_class}">{title}</span>
    </label>
    <button class="btn btn-sm btn-danger delete-task" hx-delete="/ui/tasks/{id}?confirmed=true" hx-confirm="{prompt}" hx-target="#{target}" hx-swap="innerHTML">Delete</button>
</li>"##,
        id = task.id,
        checked = if completed { " checked" } else { "" },
        next = next_status.as_str(),
        target = LIST_CONTAINER_ID,
        title_class = if completed { " completed" } else { "" },
        title = html_escape(&task.title),
        prompt = html_escape(DELETE_PROMPT),
    )
}

/// The collapsible task panel. Its body loads the list on first display.
pub fn render_task_section(collapsed: bool) -> String {
    let (content_class, icon_class) = if collapsed {
        ("task-section-content collapsed", "toggle-icon")
    } else {
        ("task-section-content", "toggle-icon rotate")
    };

    format!(
        r##"<section id="task-section" class="card">
    <header id="task-section-toggle" class="card-header" hx-post="/ui/panel/toggle" hx-target="#task-section" hx-swap="outerHTML">
        <h2>My Tasks</h2>
        <span class="{icon_class}">&#9660;</span>
    </header>
    <div class="{content_class}">
        <form id="task-form" hx-post="/ui/tasks" hx-target="#{target}" hx-swap="innerHTML" hx-on::after-request="if (event.detail.successful) this.reset()">
            <input type="text" id="new-task" name="title" placeholder="Add a new task..." autocomplete="off">
            <button class="btn btn-primary" type="submit" id="add-task">Add</button>
        </form>
        <div id="{target}" hx-get="/ui/tasks" hx-trigger="load" hx-swap="innerHTML"></div>
    </div>
</section>"##,
        icon_class = icon_class,
        content_class = content_class,
        target = LIST_CONTAINER_ID,
    )
}

/// User selector, only rendered when there are users to pick from.
pub fn render_user_selector(users: &[User], current: &str) -> String {
    if users.is_empty() {
        return String::new();
    }

    let mut options = String::new();
    let mut seen_current = false;
    for user in users {
        let selected = if user.name == current {
            seen_current = true;
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{name}"{selected}>{name}</option>"#,
            name = html_escape(&user.name),
            selected = selected,
        );
    }
    if !seen_current {
        options.insert_str(
            0,
            &format!(
                r#"<option value="{name}" selected>{name}</option>"#,
                name = html_escape(current)
            ),
        );
    }

    format!(
        r##"<div class="user-selector">
    <label for="current-user">User</label>
    <select id="current-user" name="user" hx-post="/ui/user" hx-trigger="change" hx-target="#{target}" hx-swap="innerHTML">{options}</select>
</div>"##,
        target = LIST_CONTAINER_ID,
        options = options,
    )
}

/// Whether the task panel is collapsed. Collapsed unless explicitly expanded.
pub fn panel_collapsed(storage: &LocalStorage) -> bool {
    storage.get(PANEL_COLLAPSED_KEY) != Some("false")
}

/// Flip and persist the panel state; returns the new collapsed flag.
pub fn toggle_panel(storage: &mut LocalStorage) -> Result<bool> {
    let collapsed = !panel_collapsed(storage);
    storage.set(PANEL_COLLAPSED_KEY, collapsed.to_string())?;
    Ok(collapsed)
}
