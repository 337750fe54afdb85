//! Task read operations: single fetch and filtered listing.
//!
//! Mutations live in [`super::lifecycle`]; nothing here writes. Returned rows
//! carry a live `time_progress` computed at read time, so readers do not wait
//! on the refresh job's cadence.

use super::{Database, now_ms};
use crate::error::FlowResult;
use crate::types::{Page, Task, TaskCategory, TaskFilter, TaskStatus};
use rusqlite::{Connection, Row, params};

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let category: String = row.get("category")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        // CHECK constraints keep these tokens valid; fall back leniently.
        category: TaskCategory::from_str(&category).unwrap_or(TaskCategory::Other),
        description: row.get("description")?,
        status: TaskStatus::from_str(&status).unwrap_or(TaskStatus::New),
        progress: row.get("progress")?,
        time_progress: row.get("time_progress")?,
        creator_id: row.get("creator_id")?,
        handler_id: row.get("handler_id")?,
        expected_start: row.get("expected_start")?,
        expected_end: row.get("expected_end")?,
        actual_start: row.get("actual_start")?,
        actual_end: row.get("actual_end")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> FlowResult<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Get a task by id, with `time_progress` computed at read time.
    pub fn get_task(&self, task_id: i64) -> FlowResult<Option<Task>> {
        let now = now_ms();
        self.with_conn(|conn| {
            Ok(get_task_internal(conn, task_id)?.map(|mut task| {
                task.time_progress = task.time_progress_at(now);
                task
            }))
        })
    }

    /// List tasks newest-first with paging and optional filters.
    ///
    /// Filters combine with AND; `search` is a case-insensitive substring
    /// match on the title. Returned rows carry live `time_progress`.
    pub fn list_tasks(
        &self,
        page: i64,
        page_size: i64,
        filter: &TaskFilter,
    ) -> FlowResult<Page<Task>> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let now = now_ms();

        self.with_conn(|conn| {
            let mut where_sql = String::from("WHERE 1=1");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(search) = filter.search.as_deref().map(str::trim)
                && !search.is_empty()
            {
                where_sql.push_str(" AND title LIKE ?");
                params_vec.push(Box::new(format!("%{search}%")));
            }

            if let Some(status) = filter.status {
                where_sql.push_str(" AND status = ?");
                params_vec.push(Box::new(status.as_str().to_string()));
            }

            if let Some(category) = filter.category {
                where_sql.push_str(" AND category = ?");
                params_vec.push(Box::new(category.as_str().to_string()));
            }

            if let Some(creator_id) = filter.creator_id {
                where_sql.push_str(" AND creator_id = ?");
                params_vec.push(Box::new(creator_id));
            }

            if let Some(handler_id) = filter.handler_id {
                where_sql.push_str(" AND handler_id = ?");
                params_vec.push(Box::new(handler_id));
            }

            let count_sql = format!("SELECT COUNT(*) FROM tasks {where_sql}");
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();
            let total: i64 =
                conn.query_row(&count_sql, params_refs.as_slice(), |row| row.get(0))?;

            let list_sql = format!(
                "SELECT * FROM tasks {where_sql}
                 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
            );
            params_vec.push(Box::new(page_size));
            params_vec.push(Box::new((page - 1) * page_size));
            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&list_sql)?;
            let items: Vec<Task> = stmt
                .query_map(params_refs.as_slice(), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|mut task| {
                    task.time_progress = task.time_progress_at(now);
                    task
                })
                .collect();

            Ok(Page {
                items,
                total,
                page,
                page_size,
            })
        })
    }
}
