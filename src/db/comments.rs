//! Task comments with soft delete.
//!
//! Removal flips the `deleted` flag; rows are never physically removed here,
//! and every read filters the flag.

use super::tasks::get_task_internal;
use super::users::get_active_user;
use super::{Database, now_ms};
use crate::error::{FlowError, FlowResult};
use crate::types::Comment;
use rusqlite::{Row, params};

fn parse_comment_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Add a comment to a task.
    pub fn add_comment(&self, task_id: i64, author_id: i64, content: &str) -> FlowResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(FlowError::invalid_argument("comment content cannot be empty"));
        }

        let now = now_ms();

        self.with_conn(|conn| {
            get_task_internal(conn, task_id)?.ok_or_else(|| FlowError::task_not_found(task_id))?;
            get_active_user(conn, author_id)?;

            conn.execute(
                "INSERT INTO comments (task_id, author_id, content, deleted, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5)",
                params![task_id, author_id, content, now, now],
            )?;

            Ok(Comment {
                id: conn.last_insert_rowid(),
                task_id,
                author_id,
                content: content.to_string(),
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Comment history for a task, ascending by creation time. Soft-deleted
    /// rows are filtered out.
    pub fn list_comments(&self, task_id: i64) -> FlowResult<Vec<Comment>> {
        self.with_conn(|conn| {
            get_task_internal(conn, task_id)?.ok_or_else(|| FlowError::task_not_found(task_id))?;

            let mut stmt = conn.prepare(
                "SELECT id, task_id, author_id, content, created_at, updated_at
                 FROM comments WHERE task_id = ?1 AND deleted = 0
                 ORDER BY created_at ASC, id ASC",
            )?;

            let comments = stmt
                .query_map(params![task_id], parse_comment_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(comments)
        })
    }

    /// Soft-delete a comment. Only the author or an admin may remove one.
    pub fn remove_comment(&self, comment_id: i64, user_id: i64) -> FlowResult<()> {
        let now = now_ms();

        self.with_conn(|conn| {
            let author_id: i64 = match conn.query_row(
                "SELECT author_id FROM comments WHERE id = ?1 AND deleted = 0",
                params![comment_id],
                |row| row.get(0),
            ) {
                Ok(author_id) => author_id,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(FlowError::comment_not_found(comment_id));
                }
                Err(e) => return Err(e.into()),
            };

            let user = get_active_user(conn, user_id)?;
            if !user.is_admin && author_id != user_id {
                return Err(FlowError::forbidden(format!(
                    "only an admin or the author may remove comment {comment_id}"
                )));
            }

            conn.execute(
                "UPDATE comments SET deleted = 1, updated_at = ?1 WHERE id = ?2",
                params![now, comment_id],
            )?;

            Ok(())
        })
    }
}
