//! CSV export/import codec for the whole student set.
//!
//! # Responsibility
//! - Serialize students as `ID,Username,Level` rows, one record at a time.
//! - Parse an uploaded CSV into a fully validated batch of drafts.
//!
//! # Invariants
//! - Export writes the header first, then records in the given order.
//! - Quoting follows RFC 4180 (wrap in `"`, double inner quotes) whenever a
//!   field contains a separator, quote or line break.
//! - Import never returns a partial batch: any bad row fails the whole call.
//! - Import discards the first record unread, whatever it contains.
//! - Import rejects quoting that breaks RFC 4180 anywhere in the input,
//!   header included, instead of repairing it.

use crate::model::student::{validate_username, Level, Student, StudentDraft};
use crate::model::validation::ValidationError;
use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

/// Fixed export header.
pub const CSV_HEADER: [&str; 3] = ["ID", "Username", "Level"];

const USERNAME_FIELD_INDEX: usize = 1;
const LEVEL_FIELD_INDEX: usize = 2;
const MIN_FIELDS: usize = 3;

pub type TransferResult<T> = Result<T, TransferError>;

/// Codec error for CSV export and import.
#[derive(Debug)]
pub enum TransferError {
    /// Input content is malformed; carries the offending row.
    Validation(ValidationError),
    /// Reading the upload or writing the export failed.
    Io(std::io::Error),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "csv transfer i/o failed: {err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Lazily yields the header row followed by one row per student.
pub fn export_rows<'a, I>(students: I) -> impl Iterator<Item = [String; 3]> + 'a
where
    I: IntoIterator<Item = &'a Student>,
    I::IntoIter: 'a,
{
    let header = CSV_HEADER.map(str::to_string);
    std::iter::once(header).chain(students.into_iter().map(|student| {
        [
            student.id.to_string(),
            student.username.clone(),
            student.level.as_str().to_string(),
        ]
    }))
}

/// Writes the export rows to `writer` incrementally.
///
/// Returns the number of student rows written (header excluded).
pub fn write_csv<'a, W, I>(writer: W, students: I) -> TransferResult<u64>
where
    W: Write,
    I: IntoIterator<Item = &'a Student>,
    I::IntoIter: 'a,
{
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    let mut written = 0u64;
    for (index, row) in export_rows(students).enumerate() {
        csv_writer.write_record(&row).map_err(csv_write_error)?;
        if index > 0 {
            written += 1;
        }
    }
    csv_writer.flush()?;
    Ok(written)
}

/// Parses an uploaded CSV into drafts in file order.
///
/// # Errors
/// - `Validation` for undecodable input, rows with fewer than 3 fields,
///   unknown level labels, invalid usernames, and usernames repeated
///   (case-insensitively) within the file.
/// - `Io` when the underlying reader fails.
pub fn parse_import<R: Read>(mut reader: R) -> TransferResult<Vec<StudentDraft>> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    let malformed_row = first_malformed_quoting_row(&raw);

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_slice());

    let mut drafts = Vec::new();
    let mut first_row_by_username: HashMap<String, u64> = HashMap::new();
    let mut record = ByteRecord::new();
    let mut row = 0u64;

    loop {
        let has_record = csv_reader
            .read_byte_record(&mut record)
            .map_err(|err| csv_read_error(err, row + 1))?;
        if !has_record {
            break;
        }
        row += 1;
        if malformed_row == Some(row) {
            return Err(malformed_quoting(row));
        }
        if row == 1 {
            continue;
        }

        let fields = StringRecord::from_byte_record(record.clone()).map_err(|_| {
            TransferError::Validation(ValidationError::at_row(
                row,
                "row",
                "row is not valid UTF-8",
            ))
        })?;
        let draft = parse_row(&fields, row)?;

        let key = draft.username.to_ascii_lowercase();
        if let Some(first_row) = first_row_by_username.get(&key) {
            return Err(TransferError::Validation(ValidationError::at_row(
                row,
                "username",
                format!(
                    "username `{}` duplicates row {first_row}",
                    draft.username
                ),
            )));
        }
        first_row_by_username.insert(key, row);
        drafts.push(draft);
    }

    if let Some(row) = malformed_row {
        return Err(malformed_quoting(row));
    }
    Ok(drafts)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// A `"` seen inside a quoted field: either an escape or the closing quote.
    QuoteInQuoted,
}

/// Scans raw input with RFC 4180 quoting rules and returns the 1-based
/// record holding the first quoting violation.
///
/// Records are counted the way the csv reader yields them: empty lines are
/// skipped and quoted line breaks stay inside their record.
fn first_malformed_quoting_row(raw: &[u8]) -> Option<u64> {
    let mut state = QuoteState::FieldStart;
    let mut row = 1u64;
    let mut record_started = false;

    for &byte in raw {
        let line_end = byte == b'\n' || byte == b'\r';
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, _) if !(byte == b',' || line_end) => return Some(row),
            (QuoteState::Unquoted, b'"') => return Some(row),
            (QuoteState::FieldStart, b'"') => QuoteState::Quoted,
            (_, b',') => QuoteState::FieldStart,
            (_, _) if line_end => {
                if record_started {
                    row += 1;
                }
                record_started = false;
                QuoteState::FieldStart
            }
            (_, _) => QuoteState::Unquoted,
        };
        if !line_end || state == QuoteState::Quoted {
            record_started = true;
        }
    }

    (state == QuoteState::Quoted).then_some(row)
}

fn malformed_quoting(row: u64) -> TransferError {
    TransferError::Validation(ValidationError::at_row(row, "row", "malformed quoting"))
}

fn parse_row(fields: &StringRecord, row: u64) -> TransferResult<StudentDraft> {
    if fields.len() < MIN_FIELDS {
        return Err(TransferError::Validation(ValidationError::at_row(
            row,
            "row",
            format!(
                "expected at least {MIN_FIELDS} fields, found {}",
                fields.len()
            ),
        )));
    }

    let username = fields.get(USERNAME_FIELD_INDEX).unwrap_or_default();
    let level_label = fields.get(LEVEL_FIELD_INDEX).unwrap_or_default();

    let level = Level::parse(level_label).ok_or_else(|| {
        TransferError::Validation(ValidationError::at_row(
            row,
            "level",
            format!("unknown level `{level_label}`"),
        ))
    })?;
    validate_username(username).map_err(|err| {
        TransferError::Validation(ValidationError::at_row(row, err.field(), err.to_string()))
    })?;

    Ok(StudentDraft::new(username, level))
}

fn csv_read_error(err: csv::Error, row: u64) -> TransferError {
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => TransferError::Io(io_err),
        other => TransferError::Validation(ValidationError::at_row(
            row,
            "row",
            format!("malformed csv: {other:?}"),
        )),
    }
}

fn csv_write_error(err: csv::Error) -> TransferError {
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => TransferError::Io(io_err),
        other => TransferError::Io(std::io::Error::other(format!("{other:?}"))),
    }
}
