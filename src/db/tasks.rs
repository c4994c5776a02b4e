//! Task CRUD.
//!
//! Every operation is a single statement. Create and update re-read the row by
//! id in a second, independent statement; a `None` from the read-back means the
//! row vanished in between and is not an error.

use super::{Database, now_ms};
use crate::types::{Task, TaskStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get("id")?;
    let owner: String = row.get("owner")?;
    let title: String = row.get("title")?;
    let status: String = row.get("status")?;
    let created_at: i64 = row.get("created_at")?;

    let status = status.parse::<TaskStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
    })?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_at).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(4, created_at)
    })?;

    Ok(Task {
        id,
        owner,
        title,
        status,
        created_at,
    })
}

/// Internal helper to read a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT id, owner, title, status, created_at FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

impl Database {
    /// All tasks of `owner`, newest first.
    pub fn list_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, title, status, created_at FROM tasks
                 WHERE owner = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let tasks = stmt
                .query_map(params![owner], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    /// Insert a task and read it back by id.
    pub fn create_task(&self, owner: &str, title: &str, status: TaskStatus) -> Result<Option<Task>> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (owner, title, status, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![owner, title, status.as_str(), now_ms()],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        self.get_task(id)
    }

    /// Set the status of `task_id` if it belongs to `owner`, then read it back.
    ///
    /// The read-back is by id alone, so `None` means the id does not exist at
    /// all. A row owned by someone else is returned unchanged.
    pub fn update_task_status(
        &self,
        owner: &str,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2 AND owner = ?3",
                params![status.as_str(), task_id, owner],
            )?;
            Ok(())
        })?;

        self.get_task(task_id)
    }

    /// Delete `task_id` if it belongs to `owner`. Returns the number of rows removed.
    pub fn delete_task(&self, owner: &str, task_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM tasks WHERE id = ?1 AND owner = ?2",
                params![task_id, owner],
            )?;
            Ok(removed)
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }
}
