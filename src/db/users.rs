//! User directory operations.
//!
//! The lifecycle engine resolves actors here; everything else (auth, sessions)
//! lives outside this crate. Updates go through the allow-listed [`UserPatch`]
//! so only name, email, admin flag, and active flag are ever writable.

use super::{Database, now_ms};
use crate::error::{FlowError, FlowResult};
use crate::types::{Page, User, UserPatch};
use rusqlite::{Connection, Row, params};

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        is_admin: row.get("is_admin")?,
        is_active: row.get("is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Resolve an active user on an existing connection.
///
/// Engine guards treat deactivated users as missing, so this returns
/// `NotFound` for both absent and inactive rows.
pub(crate) fn get_active_user(conn: &Connection, user_id: i64) -> FlowResult<User> {
    let result = conn.query_row(
        "SELECT id, name, email, is_admin, is_active, created_at, updated_at
         FROM users WHERE id = ?1 AND is_active = 1",
        params![user_id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(user),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(FlowError::user_not_found(user_id)),
        Err(e) => Err(e.into()),
    }
}

fn get_user_internal(conn: &Connection, user_id: i64) -> FlowResult<Option<User>> {
    let result = conn.query_row(
        "SELECT id, name, email, is_admin, is_active, created_at, updated_at
         FROM users WHERE id = ?1",
        params![user_id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Database {
    /// Create a user. Email must be unique across the directory.
    pub fn create_user(&self, name: &str, email: &str, is_admin: bool) -> FlowResult<User> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(FlowError::invalid_argument("name cannot be empty"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(FlowError::invalid_argument(format!(
                "invalid email address: '{email}'"
            )));
        }

        let now = now_ms();

        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (name, email, is_admin, is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4, ?5)",
                params![name, email, is_admin, now, now],
            );

            match result {
                Ok(_) => Ok(User {
                    id: conn.last_insert_rowid(),
                    name: name.to_string(),
                    email: email.to_string(),
                    is_admin,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                }),
                Err(e) if is_unique_violation(&e) => Err(FlowError::invalid_argument(format!(
                    "email '{email}' is already registered"
                ))),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Get an active user by id. Deactivated users are not returned.
    pub fn get_user(&self, user_id: i64) -> FlowResult<Option<User>> {
        self.with_conn(|conn| match get_active_user(conn, user_id) {
            Ok(user) => Ok(Some(user)),
            Err(FlowError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        })
    }

    /// Apply an allow-listed patch to a user.
    ///
    /// Resolves the row regardless of the active flag so a deactivated user
    /// can be reactivated through `is_active`.
    pub fn update_user(&self, user_id: i64, patch: &UserPatch) -> FlowResult<User> {
        let now = now_ms();

        self.with_conn(|conn| {
            let user =
                get_user_internal(conn, user_id)?.ok_or_else(|| FlowError::user_not_found(user_id))?;

            let name = match &patch.name {
                Some(name) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(FlowError::invalid_argument("name cannot be empty"));
                    }
                    name.to_string()
                }
                None => user.name,
            };
            let email = match &patch.email {
                Some(email) => {
                    let email = email.trim();
                    if email.is_empty() || !email.contains('@') {
                        return Err(FlowError::invalid_argument(format!(
                            "invalid email address: '{email}'"
                        )));
                    }
                    email.to_string()
                }
                None => user.email,
            };
            let is_admin = patch.is_admin.unwrap_or(user.is_admin);
            let is_active = patch.is_active.unwrap_or(user.is_active);

            let result = conn.execute(
                "UPDATE users SET name = ?1, email = ?2, is_admin = ?3, is_active = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![name, email, is_admin, is_active, now, user_id],
            );

            match result {
                Ok(_) => Ok(User {
                    id: user_id,
                    name,
                    email,
                    is_admin,
                    is_active,
                    created_at: user.created_at,
                    updated_at: now,
                }),
                Err(e) if is_unique_violation(&e) => Err(FlowError::invalid_argument(format!(
                    "email '{email}' is already registered"
                ))),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// List users ordered by id, optionally filtered by a case-insensitive
    /// substring match on name or email.
    pub fn list_users(
        &self,
        page: i64,
        page_size: i64,
        search: Option<&str>,
    ) -> FlowResult<Page<User>> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        self.with_conn(|conn| {
            let (total, items) = match &pattern {
                Some(pattern) => {
                    let total: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM users WHERE name LIKE ?1 OR email LIKE ?1",
                        params![pattern],
                        |row| row.get(0),
                    )?;
                    let mut stmt = conn.prepare(
                        "SELECT id, name, email, is_admin, is_active, created_at, updated_at
                         FROM users WHERE name LIKE ?1 OR email LIKE ?1
                         ORDER BY id LIMIT ?2 OFFSET ?3",
                    )?;
                    let items = stmt
                        .query_map(params![pattern, page_size, (page - 1) * page_size], parse_user_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    (total, items)
                }
                None => {
                    let total: i64 =
                        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
                    let mut stmt = conn.prepare(
                        "SELECT id, name, email, is_admin, is_active, created_at, updated_at
                         FROM users ORDER BY id LIMIT ?1 OFFSET ?2",
                    )?;
                    let items = stmt
                        .query_map(params![page_size, (page - 1) * page_size], parse_user_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    (total, items)
                }
            };

            Ok(Page {
                items,
                total,
                page,
                page_size,
            })
        })
    }
}
