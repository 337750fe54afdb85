//! Transition ledger: the append-only audit trail.
//!
//! Exactly one entry is written per successful lifecycle transition, inside
//! that transition's transaction. Entries are never updated or deleted here;
//! they ride the task row's cascade if a task is ever removed by an external
//! administrative process.

use super::Database;
use super::tasks::get_task_internal;
use crate::error::{FlowError, FlowResult};
use crate::types::{LedgerEntry, TransitionKind};
use rusqlite::{Connection, Row, params};

fn parse_ledger_row(row: &Row) -> rusqlite::Result<LedgerEntry> {
    let kind: String = row.get("kind")?;

    Ok(LedgerEntry {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        operator_id: row.get("operator_id")?,
        target_user_id: row.get("target_user_id")?,
        message: row.get("message")?,
        // CHECK constraint keeps the token valid; fall back leniently.
        kind: TransitionKind::from_str(&kind).unwrap_or(TransitionKind::Create),
        created_at: row.get("created_at")?,
    })
}

/// Append one ledger entry on an existing connection, inside the caller's
/// transaction.
pub(crate) fn append_entry(
    conn: &Connection,
    task_id: i64,
    operator_id: i64,
    target_user_id: i64,
    message: Option<&str>,
    kind: TransitionKind,
    now: i64,
) -> FlowResult<LedgerEntry> {
    conn.execute(
        "INSERT INTO ledger (task_id, operator_id, target_user_id, message, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![task_id, operator_id, target_user_id, message, kind.as_str(), now],
    )?;

    Ok(LedgerEntry {
        id: conn.last_insert_rowid(),
        task_id,
        operator_id,
        target_user_id,
        message: message.map(str::to_string),
        kind,
        created_at: now,
    })
}

impl Database {
    /// Full transition history for a task, ascending by creation time.
    pub fn get_ledger(&self, task_id: i64) -> FlowResult<Vec<LedgerEntry>> {
        self.with_conn(|conn| {
            get_task_internal(conn, task_id)?.ok_or_else(|| FlowError::task_not_found(task_id))?;

            let mut stmt = conn.prepare(
                "SELECT id, task_id, operator_id, target_user_id, message, kind, created_at
                 FROM ledger WHERE task_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let entries = stmt
                .query_map(params![task_id], parse_ledger_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(entries)
        })
    }
}
