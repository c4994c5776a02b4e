//! Core types shared by the task endpoint, the API client and the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Owner identity the server uses for every request.
pub const DEFAULT_OWNER: &str = "default_user";

/// Task lifecycle status. Only these two values are ever persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    /// The status a checkbox toggle moves to.
    pub fn toggled(&self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known [`TaskStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid task status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A persisted task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// Vestigial user record. Tasks do not reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}

/// Client-side view selection over the fetched task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    /// Human label used on filter buttons.
    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Pending",
            Filter::Completed => "Completed",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => task.status == TaskStatus::Pending,
            Filter::Completed => task.status == TaskStatus::Completed,
        }
    }

    /// Keep only the tasks this filter selects, preserving order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(format!(
                "unknown filter '{}' (expected all, active or completed)",
                other
            )),
        }
    }
}

/// Uniform JSON response shape of the task endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl Envelope<()> {
    /// Success carrying only a message.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            owner: DEFAULT_OWNER.to_string(),
            title: format!("task {}", id),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("pending".parse::<TaskStatus>(), Ok(TaskStatus::Pending));
        assert_eq!("completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("done".parse::<TaskStatus>().is_err());
        assert!("Completed".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn filter_selects_by_status() {
        let tasks = vec![
            task(1, TaskStatus::Pending),
            task(2, TaskStatus::Completed),
            task(3, TaskStatus::Pending),
        ];

        let ids = |f: Filter| -> Vec<i64> { f.apply(tasks.clone()).iter().map(|t| t.id).collect() };

        assert_eq!(ids(Filter::All), vec![1, 2, 3]);
        assert_eq!(ids(Filter::Active), vec![1, 3]);
        assert_eq!(ids(Filter::Completed), vec![2]);
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let json = serde_json::to_value(Envelope::<()>::acknowledged("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "done"}));

        let json = serde_json::to_value(Envelope::ok(Option::<Task>::None)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": null}));
    }
}
