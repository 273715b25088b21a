//! Student repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide filtered, paginated retrieval and single-record CRUD over the
//!   canonical `students` table.
//! - Interpret a resolved `Filter` into one SQL predicate.
//! - Own the all-or-nothing `replace_all` used by bulk import.
//!
//! # Invariants
//! - Write paths validate drafts before any SQL mutation.
//! - Username uniqueness is case-insensitive (`COLLATE NOCASE`).
//! - Ids come from `AUTOINCREMENT`, so they are never reused, even after
//!   `replace_all` empties the table.
//! - Every call holds the shared connection lock for its whole duration.

use crate::db::{lock, DbError, SharedConnection};
use crate::model::page::{Page, PageRequest};
use crate::model::student::{Level, Student, StudentDraft, StudentId, StudentValidationError};
use crate::search::resolver::Filter;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const STUDENT_SELECT_SQL: &str = "SELECT id, username, level FROM students";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for student persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(StudentValidationError),
    Db(DbError),
    NotFound(StudentId),
    /// Username already taken (case-insensitive).
    Conflict(String),
    /// Two entries of one `replace_all` batch share a username.
    DuplicateInBatch { index: usize, username: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "student not found with id {id}"),
            Self::Conflict(username) => {
                write!(f, "student with username `{username}` already exists")
            }
            Self::DuplicateInBatch { index, username } => write!(
                f,
                "batch entry {index} repeats username `{username}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted student data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StudentValidationError> for RepoError {
    fn from(value: StudentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of an atomic store replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Rows discarded from the previous contents.
    pub removed: u64,
    /// Installed rows with their fresh ids, in batch order.
    pub installed: Vec<Student>,
}

/// Repository interface for the student record store.
pub trait StudentRepository {
    /// Returns matching students ordered by id ascending, sliced per `page`.
    fn list(&self, filter: &Filter, page: PageRequest) -> RepoResult<Page<Student>>;
    fn get(&self, id: StudentId) -> RepoResult<Option<Student>>;
    fn create(&self, draft: &StudentDraft) -> RepoResult<Student>;
    fn update(&self, id: StudentId, draft: &StudentDraft) -> RepoResult<Student>;
    fn delete(&self, id: StudentId) -> RepoResult<()>;
    /// Discards every stored student and installs `batch` in order.
    fn replace_all(&self, batch: &[StudentDraft]) -> RepoResult<ReplaceOutcome>;
    /// Read-consistent snapshot of the whole store in id order.
    fn list_all(&self) -> RepoResult<Vec<Student>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed student repository.
#[derive(Clone)]
pub struct SqliteStudentRepository {
    conn: SharedConnection,
}

impl SqliteStudentRepository {
    /// Constructs a repository over a migrated shared connection.
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl StudentRepository for SqliteStudentRepository {
    fn list(&self, filter: &Filter, page: PageRequest) -> RepoResult<Page<Student>> {
        let (where_sql, bind_values) = filter_clause(filter);
        let conn = lock(&self.conn)?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM students{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!("{STUDENT_SELECT_SQL}{where_sql} ORDER BY id ASC");
        let mut page_values = bind_values;
        if let Some((limit, offset)) = page.limit_offset() {
            sql.push_str(" LIMIT ? OFFSET ?");
            page_values.push(Value::Integer(to_sql_int(limit)));
            page_values.push(Value::Integer(to_sql_int(offset)));
        }

        let items = query_students(&conn, &sql, page_values)?;
        Ok(Page::new(items, non_negative(total), page))
    }

    fn get(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!("{STUDENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_student_row(row)?));
        }
        Ok(None)
    }

    fn create(&self, draft: &StudentDraft) -> RepoResult<Student> {
        draft.validate()?;

        let conn = lock(&self.conn)?;
        if username_taken(&conn, &draft.username, None)? {
            return Err(RepoError::Conflict(draft.username.clone()));
        }

        conn.execute(
            "INSERT INTO students (username, level) VALUES (?1, ?2);",
            params![draft.username.as_str(), draft.level.as_str()],
        )
        .map_err(|err| map_unique_violation(err, &draft.username))?;

        Ok(draft.clone().into_student(conn.last_insert_rowid()))
    }

    fn update(&self, id: StudentId, draft: &StudentDraft) -> RepoResult<Student> {
        draft.validate()?;

        let conn = lock(&self.conn)?;
        if !student_exists(&conn, id)? {
            return Err(RepoError::NotFound(id));
        }
        if username_taken(&conn, &draft.username, Some(id))? {
            return Err(RepoError::Conflict(draft.username.clone()));
        }

        conn.execute(
            "UPDATE students SET username = ?1, level = ?2 WHERE id = ?3;",
            params![draft.username.as_str(), draft.level.as_str(), id],
        )
        .map_err(|err| map_unique_violation(err, &draft.username))?;

        Ok(draft.clone().into_student(id))
    }

    fn delete(&self, id: StudentId) -> RepoResult<()> {
        let conn = lock(&self.conn)?;
        let changed = conn.execute("DELETE FROM students WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn replace_all(&self, batch: &[StudentDraft]) -> RepoResult<ReplaceOutcome> {
        check_batch(batch)?;

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM students;", [])?;

        let mut installed = Vec::with_capacity(batch.len());
        {
            let mut insert =
                tx.prepare("INSERT INTO students (username, level) VALUES (?1, ?2);")?;
            for draft in batch {
                insert
                    .execute(params![draft.username.as_str(), draft.level.as_str()])
                    .map_err(|err| map_unique_violation(err, &draft.username))?;
                installed.push(draft.clone().into_student(tx.last_insert_rowid()));
            }
        }

        tx.commit()?;
        Ok(ReplaceOutcome {
            removed: removed as u64,
            installed,
        })
    }

    fn list_all(&self) -> RepoResult<Vec<Student>> {
        let conn = lock(&self.conn)?;
        query_students(
            &conn,
            &format!("{STUDENT_SELECT_SQL} ORDER BY id ASC;"),
            Vec::new(),
        )
    }

    fn count(&self) -> RepoResult<u64> {
        let conn = lock(&self.conn)?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM students;", [], |row| row.get(0))?;
        Ok(non_negative(total))
    }
}

/// Validates every draft and rejects case-insensitive duplicates.
///
/// Returns the first offending entry by zero-based batch index.
pub fn check_batch(batch: &[StudentDraft]) -> RepoResult<()> {
    let mut seen = HashSet::with_capacity(batch.len());
    for (index, draft) in batch.iter().enumerate() {
        draft.validate()?;
        if !seen.insert(draft.username.to_ascii_lowercase()) {
            return Err(RepoError::DuplicateInBatch {
                index,
                username: draft.username.clone(),
            });
        }
    }
    Ok(())
}

/// Renders a filter into a `WHERE` clause plus positional bind values.
fn filter_clause(filter: &Filter) -> (String, Vec<Value>) {
    let mut bind_values = Vec::new();
    let mut predicates = Vec::new();

    if let Filter::ByTermOrId { term, id } | Filter::ByTermOrIdAndLevel { term, id, .. } = filter {
        predicates.push(term_predicate(term, *id, &mut bind_values));
    }
    if let Some(level) = filter.level() {
        bind_values.push(level_value(level));
        predicates.push("level = ?".to_string());
    }

    if predicates.is_empty() {
        return (String::new(), bind_values);
    }
    (format!(" WHERE {}", predicates.join(" AND ")), bind_values)
}

fn term_predicate(term: &str, id: Option<StudentId>, bind_values: &mut Vec<Value>) -> String {
    // Usernames are ASCII-only, so SQLite's ASCII `lower()` is exact here.
    let contains = "instr(lower(username), ?) > 0";
    let needle = Value::Text(term.to_ascii_lowercase());
    match id {
        Some(id) => {
            bind_values.push(Value::Integer(id));
            bind_values.push(needle);
            format!("(id = ? OR {contains})")
        }
        None => {
            bind_values.push(needle);
            contains.to_string()
        }
    }
}

fn level_value(level: Level) -> Value {
    Value::Text(level.as_str().to_string())
}

fn query_students(conn: &Connection, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Student>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut students = Vec::new();
    while let Some(row) = rows.next()? {
        students.push(parse_student_row(row)?);
    }
    Ok(students)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let level_text: String = row.get("level")?;
    let level = Level::parse(&level_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid level `{level_text}` in students.level"))
    })?;

    Ok(Student {
        id: row.get("id")?,
        username: row.get("username")?,
        level,
    })
}

fn student_exists(conn: &Connection, id: StudentId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM students WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn username_taken(
    conn: &Connection,
    username: &str,
    except_id: Option<StudentId>,
) -> RepoResult<bool> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM students
            WHERE username = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![username, except_id],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn map_unique_violation(err: rusqlite::Error, username: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict(username.to_string())
        }
        _ => err.into(),
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
