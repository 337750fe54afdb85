//! Scheduled maintenance job bodies.
//!
//! Four independent jobs: time-progress refresh, warning detection,
//! periodic-task recycling, and statistics rebuild. Each isolates failure per
//! record: a bad row is logged and skipped, never aborting the rest of the
//! batch. Retry is simply the next scheduled run. Scheduling itself lives in
//! [`crate::scheduler`]; these bodies are plain functions so tests can call
//! them directly.

use crate::db::tasks::parse_task_row;
use crate::db::{Database, now_ms, stats};
use crate::error::{FlowError, FlowResult};
use crate::notify::{EVENT_TASK_RECYCLED, EVENT_TASK_WARNING, Notifier};
use crate::types::{Task, TaskCategory, TaskStatus};
use rusqlite::params;
use serde_json::json;
use tracing::{info, warn};

/// Reset threshold and fresh window for periodic tasks.
const SEVEN_DAYS_MS: i64 = 7 * 86_400_000;

/// Outcome of one maintenance run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub scanned: usize,
    pub updated: usize,
    pub notified: usize,
    pub skipped: usize,
}

/// Classify remaining-window severity from derived time progress and
/// caller-reported progress.
///
/// Levels name the percentage of the expected window still open: "5" is the
/// most severe and checked first, so a task matching several thresholds
/// reports only the tightest one.
pub fn warning_level(time_progress: i32, progress: i32) -> Option<&'static str> {
    if time_progress >= 95 && progress < 95 {
        Some("5")
    } else if time_progress >= 90 && progress < 90 {
        Some("10")
    } else if time_progress >= 80 && progress < 80 {
        Some("20")
    } else {
        None
    }
}

/// Processing tasks with a complete expected window, the candidate set for
/// refresh and warning detection.
fn processing_tasks_with_window(db: &Database) -> FlowResult<Vec<Task>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM tasks
             WHERE status = ?1 AND expected_start IS NOT NULL AND expected_end IS NOT NULL",
        )?;
        let tasks = stmt
            .query_map(params![TaskStatus::Processing.as_str()], parse_task_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    })
}

fn persist_time_progress(db: &Database, task_id: i64, time_progress: i32, now: i64) -> FlowResult<()> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE tasks SET time_progress = ?1, updated_at = ?2 WHERE id = ?3",
            params![time_progress, now, task_id],
        )?;
        Ok(())
    })
}

/// Recompute and persist `time_progress` for every Processing task with a
/// complete expected window.
pub fn refresh_time_progress(db: &Database) -> FlowResult<RunSummary> {
    let now = now_ms();
    let tasks = processing_tasks_with_window(db)?;
    let mut summary = RunSummary {
        scanned: tasks.len(),
        ..Default::default()
    };

    for task in &tasks {
        let time_progress = task.time_progress_at(now);
        match persist_time_progress(db, task.id, time_progress, now) {
            Ok(()) => summary.updated += 1,
            Err(e) => {
                warn!(task_id = task.id, err = %e, "time-progress refresh failed, skipping task");
                summary.skipped += 1;
            }
        }
    }

    if summary.updated > 0 {
        info!(
            updated = summary.updated,
            scanned = summary.scanned,
            "time progress refreshed"
        );
    }
    Ok(summary)
}

/// Refresh time progress and emit a warning notification for every
/// Processing task running out of expected window.
pub fn detect_warnings(db: &Database, notifier: &dyn Notifier) -> FlowResult<RunSummary> {
    let now = now_ms();
    let tasks = processing_tasks_with_window(db)?;
    let mut summary = RunSummary {
        scanned: tasks.len(),
        ..Default::default()
    };

    for task in &tasks {
        let time_progress = task.time_progress_at(now);
        if let Err(e) = persist_time_progress(db, task.id, time_progress, now) {
            warn!(task_id = task.id, err = %e, "warning scan failed, skipping task");
            summary.skipped += 1;
            continue;
        }
        summary.updated += 1;

        if let Some(level) = warning_level(time_progress, task.progress) {
            notifier.notify(
                task.handler_id,
                EVENT_TASK_WARNING,
                json!({
                    "task_id": task.id,
                    "title": task.title,
                    "level": level,
                    "progress": task.progress,
                    "time_progress": time_progress,
                }),
            );
            summary.notified += 1;
        }
    }

    if summary.notified > 0 {
        info!(
            warned = summary.notified,
            scanned = summary.scanned,
            "at-risk tasks flagged"
        );
    }
    Ok(summary)
}

/// Reset periodic tasks that finished at least seven days ago back to New
/// with a fresh seven-day window.
///
/// The reset is not a lifecycle transition, so no ledger entry is written;
/// the status-bucket statistics delta still applies inside each task's
/// transaction so the aggregates stay consistent.
pub fn recycle_periodic_tasks(db: &Database, notifier: &dyn Notifier) -> FlowResult<RunSummary> {
    let now = now_ms();

    let candidates: Vec<Task> = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM tasks
             WHERE category = ?1 AND status IN (?2, ?3) AND actual_end IS NOT NULL",
        )?;
        let tasks = stmt
            .query_map(
                params![
                    TaskCategory::Periodic.as_str(),
                    TaskStatus::Completed.as_str(),
                    TaskStatus::Closed.as_str(),
                ],
                parse_task_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok::<_, FlowError>(tasks)
    })?;

    let mut summary = RunSummary {
        scanned: candidates.len(),
        ..Default::default()
    };

    for task in &candidates {
        let due = task
            .actual_end
            .is_some_and(|ended| now - ended >= SEVEN_DAYS_MS);
        if !due {
            continue;
        }

        let expected_end = now + SEVEN_DAYS_MS;
        let reset: FlowResult<()> = db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE tasks SET status = ?1, progress = 0, time_progress = 0,
                     actual_start = NULL, actual_end = NULL,
                     expected_start = ?2, expected_end = ?3, updated_at = ?2
                 WHERE id = ?4",
                params![TaskStatus::New.as_str(), now, expected_end, task.id],
            )?;
            stats::apply_status_delta(&tx, task.status, TaskStatus::New, now)?;
            tx.commit()?;
            Ok(())
        });

        match reset {
            Ok(()) => {
                summary.updated += 1;
                notifier.notify(
                    task.handler_id,
                    EVENT_TASK_RECYCLED,
                    json!({
                        "task_id": task.id,
                        "title": task.title,
                        "expected_end": expected_end,
                    }),
                );
                summary.notified += 1;
                info!(task_id = task.id, "periodic task recycled");
            }
            Err(e) => {
                warn!(task_id = task.id, err = %e, "periodic recycle failed, skipping task");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Full statistics rebuild, the reconciliation pass for any drift the
/// incremental deltas missed.
pub fn rebuild_statistics(db: &Database) -> FlowResult<RunSummary> {
    db.rebuild_statistics()?;
    Ok(RunSummary::default())
}
