//! Lifecycle engine: the six task transitions plus the direct edit.
//!
//! Every operation validates all guards before touching anything, then runs
//! task mutation, ledger append, and statistics delta inside one transaction.
//! A guard failure therefore never leaves a partial write, and a storage
//! failure rolls the whole unit back.
//!
//! Statuses move as: create→New; transfer→Pending; respond→Processing (from
//! New/Pending/Suspended only); suspend→Suspended (from Processing only);
//! complete→Completed and close→Closed (permission-gated, any status).

use super::tasks::get_task_internal;
use super::users::get_active_user;
use super::{Database, ledger, now_ms, stats};
use crate::error::{FlowError, FlowResult};
use crate::types::{NewTask, Task, TaskPatch, TaskStatus, TransitionKind, User};
use rusqlite::{Connection, params};
use tracing::{debug, info};

fn require_task(conn: &Connection, task_id: i64) -> FlowResult<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| FlowError::task_not_found(task_id))
}

fn require_admin_or_handler(user: &User, task: &Task, action: &'static str) -> FlowResult<()> {
    if user.is_admin || task.handler_id == user.id {
        Ok(())
    } else {
        Err(FlowError::forbidden(format!(
            "only an admin or the current handler may {action} task {}",
            task.id
        )))
    }
}

impl Database {
    /// Create a task in status New with an initial ledger entry.
    pub fn create_task(&self, input: &NewTask) -> FlowResult<Task> {
        if input.title.trim().is_empty() {
            return Err(FlowError::invalid_argument("title cannot be empty"));
        }
        if let (Some(start), Some(end)) = (input.expected_start, input.expected_end)
            && end <= start
        {
            return Err(FlowError::invalid_argument(
                "expected_end must be after expected_start",
            ));
        }

        let now = now_ms();
        let title = input.title.trim().to_string();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            // Both references must resolve to active users
            get_active_user(&tx, input.creator_id)?;
            get_active_user(&tx, input.handler_id)?;

            tx.execute(
                "INSERT INTO tasks (
                    title, category, description, status, progress, time_progress,
                    creator_id, handler_id, expected_start, expected_end, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    &title,
                    input.category.as_str(),
                    input.description,
                    TaskStatus::New.as_str(),
                    input.creator_id,
                    input.handler_id,
                    input.expected_start,
                    input.expected_end,
                    now,
                    now,
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            ledger::append_entry(
                &tx,
                task_id,
                input.creator_id,
                input.handler_id,
                None,
                TransitionKind::Create,
                now,
            )?;
            stats::apply_create_delta(&tx, TaskStatus::New, input.category, now)?;

            tx.commit()?;

            info!(
                task_id,
                creator_id = input.creator_id,
                handler_id = input.handler_id,
                category = %input.category,
                "task created"
            );
            Ok(Task {
                id: task_id,
                title,
                category: input.category,
                description: input.description.clone(),
                status: TaskStatus::New,
                progress: 0,
                time_progress: 0,
                creator_id: input.creator_id,
                handler_id: input.handler_id,
                expected_start: input.expected_start,
                expected_end: input.expected_end,
                actual_start: None,
                actual_end: None,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Hand a task to another handler. The task enters Pending until the new
    /// handler responds.
    pub fn transfer_task(
        &self,
        task_id: i64,
        operator_id: i64,
        target_id: i64,
        message: Option<&str>,
    ) -> FlowResult<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = require_task(&tx, task_id)?;
            let operator = get_active_user(&tx, operator_id)?;
            require_admin_or_handler(&operator, &task, "transfer")?;
            get_active_user(&tx, target_id)?;

            tx.execute(
                "UPDATE tasks SET handler_id = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
                params![target_id, TaskStatus::Pending.as_str(), now, task_id],
            )?;
            ledger::append_entry(
                &tx,
                task_id,
                operator_id,
                target_id,
                message,
                TransitionKind::Transfer,
                now,
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::Pending, now)?;

            tx.commit()?;

            info!(task_id, operator_id, target_id, "task transferred");
            Ok(Task {
                handler_id: target_id,
                status: TaskStatus::Pending,
                updated_at: now,
                ..task
            })
        })
    }

    /// Current handler accepts the task and starts (or resumes) work.
    ///
    /// Legal only from New, Pending, or Suspended. Sets `actual_start` on the
    /// first respond and never resets it.
    pub fn respond_task(&self, task_id: i64, user_id: i64) -> FlowResult<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = require_task(&tx, task_id)?;
            get_active_user(&tx, user_id)?;
            if task.handler_id != user_id {
                return Err(FlowError::forbidden(format!(
                    "only the current handler may respond to task {task_id}"
                )));
            }
            if !matches!(
                task.status,
                TaskStatus::New | TaskStatus::Pending | TaskStatus::Suspended
            ) {
                return Err(FlowError::invalid_state("respond to", task.status));
            }

            let actual_start = task.actual_start.unwrap_or(now);
            tx.execute(
                "UPDATE tasks SET status = ?1, actual_start = ?2, updated_at = ?3 WHERE id = ?4",
                params![TaskStatus::Processing.as_str(), actual_start, now, task_id],
            )?;
            ledger::append_entry(
                &tx,
                task_id,
                user_id,
                user_id,
                None,
                TransitionKind::Respond,
                now,
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::Processing, now)?;

            tx.commit()?;

            info!(task_id, user_id, "task responded");
            Ok(Task {
                status: TaskStatus::Processing,
                actual_start: Some(actual_start),
                updated_at: now,
                ..task
            })
        })
    }

    /// Pause work on a Processing task.
    pub fn suspend_task(
        &self,
        task_id: i64,
        user_id: i64,
        message: Option<&str>,
    ) -> FlowResult<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = require_task(&tx, task_id)?;
            let user = get_active_user(&tx, user_id)?;
            require_admin_or_handler(&user, &task, "suspend")?;
            if task.status != TaskStatus::Processing {
                return Err(FlowError::invalid_state("suspend", task.status));
            }

            tx.execute(
                "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![TaskStatus::Suspended.as_str(), now, task_id],
            )?;
            ledger::append_entry(
                &tx,
                task_id,
                user_id,
                task.handler_id,
                message,
                TransitionKind::Suspend,
                now,
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::Suspended, now)?;

            tx.commit()?;

            info!(task_id, user_id, "task suspended");
            Ok(Task {
                status: TaskStatus::Suspended,
                updated_at: now,
                ..task
            })
        })
    }

    /// Mark a task done: progress 100, `actual_end` stamped once.
    pub fn complete_task(
        &self,
        task_id: i64,
        user_id: i64,
        message: Option<&str>,
    ) -> FlowResult<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = require_task(&tx, task_id)?;
            let user = get_active_user(&tx, user_id)?;
            require_admin_or_handler(&user, &task, "complete")?;

            let actual_end = task.actual_end.unwrap_or(now);
            tx.execute(
                "UPDATE tasks SET status = ?1, progress = 100, actual_end = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![TaskStatus::Completed.as_str(), actual_end, now, task_id],
            )?;
            ledger::append_entry(
                &tx,
                task_id,
                user_id,
                task.handler_id,
                message,
                TransitionKind::Complete,
                now,
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::Completed, now)?;

            tx.commit()?;

            info!(task_id, user_id, "task completed");
            Ok(Task {
                status: TaskStatus::Completed,
                progress: 100,
                actual_end: Some(actual_end),
                updated_at: now,
                ..task
            })
        })
    }

    /// Close a task. `actual_end` is stamped only if still unset, so closing
    /// after completion keeps the completion timestamp.
    pub fn close_task(
        &self,
        task_id: i64,
        user_id: i64,
        message: Option<&str>,
    ) -> FlowResult<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let task = require_task(&tx, task_id)?;
            let user = get_active_user(&tx, user_id)?;
            require_admin_or_handler(&user, &task, "close")?;

            let actual_end = task.actual_end.unwrap_or(now);
            tx.execute(
                "UPDATE tasks SET status = ?1, actual_end = ?2, updated_at = ?3 WHERE id = ?4",
                params![TaskStatus::Closed.as_str(), actual_end, now, task_id],
            )?;
            ledger::append_entry(
                &tx,
                task_id,
                user_id,
                task.handler_id,
                message,
                TransitionKind::Close,
                now,
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::Closed, now)?;

            tx.commit()?;

            info!(task_id, user_id, "task closed");
            Ok(Task {
                status: TaskStatus::Closed,
                actual_end: Some(actual_end),
                updated_at: now,
                ..task
            })
        })
    }

    /// Direct edit of description/progress by the current handler or an
    /// admin. Bypasses the ledger: no transition is recorded and the
    /// statistics are untouched.
    pub fn edit_task(&self, task_id: i64, user_id: i64, patch: &TaskPatch) -> FlowResult<Task> {
        if let Some(progress) = patch.progress
            && !(0..=100).contains(&progress)
        {
            return Err(FlowError::invalid_argument(format!(
                "progress must be between 0 and 100, got {progress}"
            )));
        }

        let now = now_ms();

        self.with_conn(|conn| {
            let task = require_task(conn, task_id)?;
            let user = get_active_user(conn, user_id)?;
            require_admin_or_handler(&user, &task, "edit")?;

            if patch.description.is_none() && patch.progress.is_none() {
                return Ok(task);
            }

            let description = patch.description.clone().or(task.description.clone());
            let progress = patch.progress.unwrap_or(task.progress);

            conn.execute(
                "UPDATE tasks SET description = ?1, progress = ?2, updated_at = ?3 WHERE id = ?4",
                params![description, progress, now, task_id],
            )?;

            debug!(task_id, user_id, "task fields edited");
            Ok(Task {
                description,
                progress,
                updated_at: now,
                ..task
            })
        })
    }
}
