//! Task controller: the UI's state plus the operations user actions trigger.
//!
//! Every mutation goes through the [`TaskApi`] and is followed by a full
//! reload; the view is only ever fed from a fresh list.

use std::sync::Arc;
use tracing::{debug, error};

use crate::client::TaskApi;
use crate::types::{DEFAULT_OWNER, Filter, Task, TaskStatus};

/// Prompt shown before a task is deleted.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this task?";

/// Selection the controller applies to every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub filter: Filter,
    pub user: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            filter: Filter::All,
            user: DEFAULT_OWNER.to_string(),
        }
    }
}

/// Where the controller sends its output.
pub trait TaskView {
    /// Replace whatever is shown with `tasks`.
    fn render_tasks(&mut self, state: &UiState, tasks: &[Task]);

    /// Report a failed operation. Nothing is retried.
    fn show_error(&mut self, context: &str, message: &str);
}

/// Explicit user confirmation for destructive actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmation that was already given (or refused) up front.
#[derive(Debug, Clone, Copy)]
pub struct Confirmed(pub bool);

impl Confirm for Confirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub struct TaskController {
    api: Arc<dyn TaskApi>,
    state: UiState,
}

impl TaskController {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            state: UiState::default(),
        }
    }

    /// Start with `user` selected instead of the default.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        if !user.trim().is_empty() {
            self.state.user = user;
        }
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Fetch the current user's tasks, filter them and render.
    pub async fn load<V: TaskView + Send>(&self, view: &mut V) {
        match self.api.list_tasks(&self.state.user).await {
            Ok(envelope) if envelope.success => {
                let tasks = self.state.filter.apply(envelope.data.unwrap_or_default());
                debug!(filter = %self.state.filter, count = tasks.len(), "Rendering tasks");
                view.render_tasks(&self.state, &tasks);
            }
            Ok(envelope) => {
                report(view, "Failed to load tasks", envelope.message.as_deref());
            }
            Err(e) => report(view, "Request failed", Some(&e.to_string())),
        }
    }

    /// Add a task. Blank titles never leave the controller.
    ///
    /// Returns whether the server accepted the task.
    pub async fn add<V: TaskView + Send>(&self, title: &str, view: &mut V) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }

        match self.api.create_task(&self.state.user, title).await {
            Ok(envelope) if envelope.success => {
                self.load(view).await;
                true
            }
            Ok(envelope) => {
                report(view, "Failed to add task", envelope.message.as_deref());
                false
            }
            Err(e) => {
                report(view, "Request failed", Some(&e.to_string()));
                false
            }
        }
    }

    /// Change a task's status, then reload whatever the outcome.
    pub async fn set_status<V: TaskView + Send>(&self, task_id: i64, status: TaskStatus, view: &mut V) -> bool {
        let updated = match self
            .api
            .update_task_status(&self.state.user, task_id, status)
            .await
        {
            Ok(envelope) if envelope.success => true,
            Ok(envelope) => {
                report(view, "Failed to update task", envelope.message.as_deref());
                false
            }
            Err(e) => {
                report(view, "Request failed", Some(&e.to_string()));
                false
            }
        };

        self.load(view).await;
        updated
    }

    /// Delete a task once `confirm` agrees, then reload.
    ///
    /// A refused confirmation does nothing at all.
    pub async fn remove<V, C>(&self, task_id: i64, confirm: &C, view: &mut V) -> bool
    where
        V: TaskView + Send,
        C: Confirm + Sync,
    {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!(task_id, "Delete cancelled");
            return false;
        }

        let removed = match self.api.delete_task(&self.state.user, task_id).await {
            Ok(envelope) if envelope.success => true,
            Ok(envelope) => {
                report(view, "Failed to delete task", envelope.message.as_deref());
                false
            }
            Err(e) => {
                report(view, "Request failed", Some(&e.to_string()));
                false
            }
        };

        self.load(view).await;
        removed
    }

    pub async fn change_filter<V: TaskView + Send>(&mut self, filter: Filter, view: &mut V) {
        self.state.filter = filter;
        self.load(view).await;
    }

    /// Switch user. Blank names are ignored but the list is still reloaded.
    pub async fn change_user<V: TaskView + Send>(&mut self, user: &str, view: &mut V) {
        let user = user.trim();
        if !user.is_empty() {
            self.state.user = user.to_string();
        }
        self.load(view).await;
    }
}

fn report<V: TaskView>(view: &mut V, context: &str, message: Option<&str>) {
    let message = message.unwrap_or("no message");
    error!("{}: {}", context, message);
    view.show_error(context, message);
}
