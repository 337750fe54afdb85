//! Core types for the task-relay service.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Task lifecycle status.
///
/// New is the creation-only state. Completed and Closed end the normal flow,
/// but New/Pending/Suspended can re-enter Processing via respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    Pending,
    Processing,
    Suspended,
    Completed,
    Closed,
}

impl TaskStatus {
    /// All statuses, in lifecycle order. Used to seed zeroed distributions.
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::New,
        TaskStatus::Pending,
        TaskStatus::Processing,
        TaskStatus::Suspended,
        TaskStatus::Completed,
        TaskStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Suspended => "suspended",
            TaskStatus::Completed => "completed",
            TaskStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TaskStatus::New),
            "pending" => Some(TaskStatus::Pending),
            "processing" => Some(TaskStatus::Processing),
            "suspended" => Some(TaskStatus::Suspended),
            "completed" => Some(TaskStatus::Completed),
            "closed" => Some(TaskStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Version,
    Urgent,
    Normal,
    Periodic,
    Other,
}

impl TaskCategory {
    /// All categories. Used to seed zeroed distributions.
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::Version,
        TaskCategory::Urgent,
        TaskCategory::Normal,
        TaskCategory::Periodic,
        TaskCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Version => "version",
            TaskCategory::Urgent => "urgent",
            TaskCategory::Normal => "normal",
            TaskCategory::Periodic => "periodic",
            TaskCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "version" => Some(TaskCategory::Version),
            "urgent" => Some(TaskCategory::Urgent),
            "normal" => Some(TaskCategory::Normal),
            "periodic" => Some(TaskCategory::Periodic),
            "other" => Some(TaskCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of lifecycle transition recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Create,
    Transfer,
    Respond,
    Suspend,
    Complete,
    Close,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Create => "create",
            TransitionKind::Transfer => "transfer",
            TransitionKind::Respond => "respond",
            TransitionKind::Suspend => "suspend",
            TransitionKind::Complete => "complete",
            TransitionKind::Close => "close",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(TransitionKind::Create),
            "transfer" => Some(TransitionKind::Transfer),
            "respond" => Some(TransitionKind::Respond),
            "suspend" => Some(TransitionKind::Suspend),
            "complete" => Some(TransitionKind::Complete),
            "close" => Some(TransitionKind::Close),
            _ => None,
        }
    }
}

/// A tracked work item.
///
/// All timestamps are UTC epoch milliseconds. `progress` is caller-reported;
/// `time_progress` is derived from the expected window and never caller-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub category: TaskCategory,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub progress: i32,
    pub time_progress: i32,
    pub creator_id: i64,
    pub handler_id: i64,
    pub expected_start: Option<i64>,
    pub expected_end: Option<i64>,
    pub actual_start: Option<i64>,
    pub actual_end: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Percentage of the expected window elapsed at `now_ms`, clamped to 0–100.
    ///
    /// Returns 0 unless both expected timestamps are set. A degenerate window
    /// (end == start) is 0 rather than a division by zero.
    pub fn time_progress_at(&self, now_ms: i64) -> i32 {
        let (Some(start), Some(end)) = (self.expected_start, self.expected_end) else {
            return 0;
        };
        if end == start {
            return 0;
        }
        if now_ms < start {
            return 0;
        }
        if now_ms > end {
            return 100;
        }
        ((now_ms - start) * 100 / (end - start)) as i32
    }
}

/// Immutable audit record of one lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub task_id: i64,
    pub operator_id: i64,
    pub target_user_id: i64,
    pub message: Option<String>,
    pub kind: TransitionKind,
    pub created_at: i64,
}

/// A directory user. The lifecycle engine consumes only id/is_admin/is_active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A comment on a task. Soft-deleted rows keep their row but are filtered
/// from every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub category: TaskCategory,
    pub description: Option<String>,
    pub creator_id: i64,
    pub handler_id: i64,
    pub expected_start: Option<i64>,
    pub expected_end: Option<i64>,
}

/// Direct-edit patch applied by the current handler or an admin.
/// Bypasses the ledger: no transition is recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub progress: Option<i32>,
}

/// Allow-listed user update. Fields outside this set are unrepresentable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

/// Filters for task listing. All fields combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub status: Option<TaskStatus>,
    pub category: Option<TaskCategory>,
    pub creator_id: Option<i64>,
    pub handler_id: Option<i64>,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Aggregate counters as served to readers.
///
/// Distributions carry every status/category key, zeroed when no row is
/// stored. `updated_at` is the newest aggregate-row timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: i64,
    pub status_distribution: HashMap<String, i64>,
    pub category_distribution: HashMap<String, i64>,
    pub updated_at: i64,
}
