//! Student use-case service.
//!
//! # Responsibility
//! - Provide search, CRUD and bulk transfer entry points over a student store.
//! - Resolve free-text search input and normalize paging before querying.
//! - Keep import all-or-nothing: parse and validate the whole upload first.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Export streams from a snapshot; the store lock is not held during I/O.
//! - `replace_all` is only reached with a complete, validated batch.

use crate::config::PagingConfig;
use crate::model::page::{Page, PageRequest};
use crate::model::student::{Level, Student, StudentDraft, StudentId};
use crate::repo::student_repo::StudentRepository;
use crate::search::resolver::resolve;
use crate::service::error::{ServiceError, ServiceResult};
use crate::transfer::csv_codec::{parse_import, write_csv};
use log::{debug, error, info};
use serde::Serialize;
use std::io::{Read, Write};
use std::time::Instant;

/// Search input from a single search box plus level dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentQuery {
    pub term: Option<String>,
    pub level: Option<Level>,
    pub page: Option<PageRequest>,
}

/// Outcome of a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub exported: u64,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Students installed from the file.
    pub imported: u64,
    /// Students discarded from the previous store contents.
    pub replaced: u64,
}

/// Use-case service wrapper for student operations.
pub struct StudentService<R: StudentRepository> {
    repo: R,
    paging: PagingConfig,
}

impl<R: StudentRepository> StudentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R, paging: PagingConfig) -> Self {
        Self { repo, paging }
    }

    /// Resolves the query into a filter and returns one page of matches.
    ///
    /// A missing page request uses page 0 with the default size.
    pub fn search(&self, query: &StudentQuery) -> ServiceResult<Page<Student>> {
        let filter = resolve(query.term.as_deref(), query.level);
        let page = self
            .paging
            .normalize(query.page.unwrap_or(PageRequest::of(0, 0)));
        let result = self.repo.list(&filter, page)?;
        debug!(
            "event=student_search module=service status=ok filter={:?} returned={} total={}",
            filter,
            result.items.len(),
            result.total
        );
        Ok(result)
    }

    pub fn get(&self, id: StudentId) -> ServiceResult<Student> {
        self.repo.get(id)?.ok_or(ServiceError::NotFound(id))
    }

    pub fn create(&self, draft: &StudentDraft) -> ServiceResult<Student> {
        draft.validate()?;
        let student = self.repo.create(draft)?;
        info!(
            "event=student_create module=service status=ok id={} level={}",
            student.id, student.level
        );
        Ok(student)
    }

    pub fn update(&self, id: StudentId, draft: &StudentDraft) -> ServiceResult<Student> {
        draft.validate()?;
        let student = self.repo.update(id, draft)?;
        info!(
            "event=student_update module=service status=ok id={} level={}",
            student.id, student.level
        );
        Ok(student)
    }

    pub fn delete(&self, id: StudentId) -> ServiceResult<()> {
        self.repo.delete(id)?;
        info!("event=student_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    /// Writes the whole store as CSV to `writer`.
    pub fn export<W: Write>(&self, writer: W) -> ServiceResult<ExportSummary> {
        let started_at = Instant::now();
        let snapshot = self.repo.list_all()?;

        match write_csv(writer, &snapshot) {
            Ok(exported) => {
                info!(
                    "event=student_export module=service status=ok rows={} duration_ms={}",
                    exported,
                    started_at.elapsed().as_millis()
                );
                Ok(ExportSummary { exported })
            }
            Err(err) => {
                error!(
                    "event=student_export module=service status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Replaces the whole store with the students parsed from `reader`.
    ///
    /// # Errors
    /// - `Validation` naming the offending row; the store is untouched.
    /// - `Io` when reading fails; the store is untouched.
    pub fn import<Rd: Read>(&self, reader: Rd) -> ServiceResult<ImportSummary> {
        let started_at = Instant::now();
        let batch = match parse_import(reader) {
            Ok(batch) => batch,
            Err(err) => {
                error!(
                    "event=student_import module=service status=error stage=parse duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        let outcome = self.repo.replace_all(&batch)?;
        let imported = outcome.installed.len() as u64;
        let replaced = outcome.removed;
        info!(
            "event=student_import module=service status=ok imported={} replaced={} duration_ms={}",
            imported,
            replaced,
            started_at.elapsed().as_millis()
        );
        Ok(ImportSummary { imported, replaced })
    }
}
