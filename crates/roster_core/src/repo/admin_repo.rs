//! Administrator account storage.
//!
//! # Invariants
//! - Admin usernames are unique (exact match).
//! - Only password hashes are stored; plaintext never reaches this layer.

use crate::db::{lock, SharedConnection};
use crate::repo::student_repo::{RepoError, RepoResult};
use rusqlite::params;

/// Stored administrator account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Repository interface for administrator accounts.
pub trait AdminRepository {
    fn find_by_username(&self, username: &str) -> RepoResult<Option<AdminRecord>>;
    /// Inserts a new admin; `Conflict` when the username exists.
    fn create(&self, username: &str, password_hash: &str) -> RepoResult<AdminRecord>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed admin repository sharing the store connection.
#[derive(Clone)]
pub struct SqliteAdminRepository {
    conn: SharedConnection,
}

impl SqliteAdminRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl AdminRepository for SqliteAdminRepository {
    fn find_by_username(&self, username: &str) -> RepoResult<Option<AdminRecord>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT id, username, password_hash FROM admins WHERE username = ?1;")?;
        let mut rows = stmt.query([username])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(AdminRecord {
                id: row.get("id")?,
                username: row.get("username")?,
                password_hash: row.get("password_hash")?,
            }));
        }
        Ok(None)
    }

    fn create(&self, username: &str, password_hash: &str) -> RepoResult<AdminRecord> {
        let conn = lock(&self.conn)?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE username = ?1);",
            [username],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(RepoError::Conflict(username.to_string()));
        }

        conn.execute(
            "INSERT INTO admins (username, password_hash) VALUES (?1, ?2);",
            params![username, password_hash],
        )?;

        Ok(AdminRecord {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    fn count(&self) -> RepoResult<u64> {
        let conn = lock(&self.conn)?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM admins;", [], |row| row.get(0))?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
