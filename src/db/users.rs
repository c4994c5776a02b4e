//! The `users` table. Tasks carry a free-text owner and never join to it.

use super::Database;
use crate::types::User;
use anyhow::{Result, anyhow};
use rusqlite::params;

impl Database {
    /// Register a user name.
    pub fn create_user(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("User name is required"));
        }

        self.with_conn(|conn| {
            conn.execute("INSERT INTO users (name) VALUES (?1)", params![name])?;
            Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
            })
        })
    }

    /// All users, ordered by name.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY name, id")?;
            let users = stmt
                .query_map([], |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }
}
