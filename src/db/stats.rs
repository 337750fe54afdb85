//! Statistics engine: incremental aggregate counters with full rebuild.
//!
//! Counters live in the `statistics` table as (dimension, key) → JSON value
//! rows. Lifecycle transitions apply deltas inside their own transaction, so
//! the aggregates can never drift from a committed mutation; the rebuild
//! recomputes everything from task rows and is the reconciliation path for
//! anything else (crashes mid-history, manual surgery, older data).
//!
//! The connection is mutex-guarded and SQLite allows one writer, so a rebuild
//! transaction and an incremental delta never interleave; concurrent callers
//! resolve to last-writer-wins at whole-transaction granularity.

use super::{Database, now_ms};
use crate::error::FlowResult;
use crate::types::{StatsSnapshot, TaskCategory, TaskStatus};
use rusqlite::{Connection, params};
use std::collections::HashMap;

pub(crate) const DIM_STATUS: &str = "status";
pub(crate) const DIM_CATEGORY: &str = "category";
pub(crate) const DIM_OVERVIEW: &str = "overview";
pub(crate) const KEY_TOTAL: &str = "total";

fn read_count(conn: &Connection, dimension: &str, key: &str) -> FlowResult<i64> {
    let result = conn.query_row(
        "SELECT value_json FROM statistics WHERE dimension = ?1 AND key = ?2",
        params![dimension, key],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or(0)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn write_count(
    conn: &Connection,
    dimension: &str,
    key: &str,
    count: i64,
    now: i64,
) -> FlowResult<()> {
    conn.execute(
        "INSERT INTO statistics (dimension, key, value_json, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(dimension, key) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = excluded.updated_at",
        params![dimension, key, serde_json::to_string(&count)?, now],
    )?;
    Ok(())
}

/// Adjust one counter by `delta`, flooring at zero. Runs on the caller's
/// connection so it joins the caller's transaction.
pub(crate) fn bump_count(
    conn: &Connection,
    dimension: &str,
    key: &str,
    delta: i64,
    now: i64,
) -> FlowResult<()> {
    let current = read_count(conn, dimension, key)?;
    write_count(conn, dimension, key, (current + delta).max(0), now)
}

/// Counter deltas for a newly created task.
pub(crate) fn apply_create_delta(
    conn: &Connection,
    status: TaskStatus,
    category: TaskCategory,
    now: i64,
) -> FlowResult<()> {
    bump_count(conn, DIM_OVERVIEW, KEY_TOTAL, 1, now)?;
    bump_count(conn, DIM_STATUS, status.as_str(), 1, now)?;
    bump_count(conn, DIM_CATEGORY, category.as_str(), 1, now)
}

/// Counter deltas for a status change. No-op when the status is unchanged.
pub(crate) fn apply_status_delta(
    conn: &Connection,
    old: TaskStatus,
    new: TaskStatus,
    now: i64,
) -> FlowResult<()> {
    if old == new {
        return Ok(());
    }
    bump_count(conn, DIM_STATUS, old.as_str(), -1, now)?;
    bump_count(conn, DIM_STATUS, new.as_str(), 1, now)
}

impl Database {
    /// Recompute every aggregate from task rows, replacing the stored
    /// counters atomically.
    ///
    /// Every status and category key is written, zero or not, so the read
    /// path never sees a partial key set after a rebuild.
    pub fn rebuild_statistics(&self) -> FlowResult<()> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut by_status: HashMap<String, i64> = HashMap::new();
            for status in TaskStatus::ALL {
                by_status.insert(status.as_str().to_string(), 0);
            }
            let mut by_category: HashMap<String, i64> = HashMap::new();
            for category in TaskCategory::ALL {
                by_category.insert(category.as_str().to_string(), 0);
            }

            {
                let mut stmt =
                    tx.prepare("SELECT status, COUNT(*) as cnt FROM tasks GROUP BY status")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (status, count) = row?;
                    by_status.insert(status, count);
                }

                let mut stmt =
                    tx.prepare("SELECT category, COUNT(*) as cnt FROM tasks GROUP BY category")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                for row in rows {
                    let (category, count) = row?;
                    by_category.insert(category, count);
                }
            }

            let total: i64 = tx.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;

            tx.execute("DELETE FROM statistics", [])?;
            write_count(&tx, DIM_OVERVIEW, KEY_TOTAL, total, now)?;
            for (status, count) in &by_status {
                write_count(&tx, DIM_STATUS, status, *count, now)?;
            }
            for (category, count) in &by_category {
                write_count(&tx, DIM_CATEGORY, category, *count, now)?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Read the stored aggregates.
    ///
    /// Distributions are seeded with every status/category key at 0 and then
    /// filled from stored rows, so missing rows read as zero counts.
    pub fn get_statistics(&self) -> FlowResult<StatsSnapshot> {
        self.with_conn(|conn| {
            let mut status_distribution: HashMap<String, i64> = HashMap::new();
            for status in TaskStatus::ALL {
                status_distribution.insert(status.as_str().to_string(), 0);
            }
            let mut category_distribution: HashMap<String, i64> = HashMap::new();
            for category in TaskCategory::ALL {
                category_distribution.insert(category.as_str().to_string(), 0);
            }

            let mut total = 0i64;
            let mut updated_at = 0i64;

            let mut stmt =
                conn.prepare("SELECT dimension, key, value_json, updated_at FROM statistics")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?;

            for row in rows {
                let (dimension, key, value_json, row_updated) = row?;
                let count: i64 = serde_json::from_str(&value_json).unwrap_or(0);
                updated_at = updated_at.max(row_updated);

                match dimension.as_str() {
                    DIM_OVERVIEW if key == KEY_TOTAL => total = count,
                    DIM_STATUS => {
                        status_distribution.insert(key, count);
                    }
                    DIM_CATEGORY => {
                        category_distribution.insert(key, count);
                    }
                    _ => {}
                }
            }

            Ok(StatsSnapshot {
                total,
                status_distribution,
                category_distribution,
                updated_at,
            })
        })
    }
}
