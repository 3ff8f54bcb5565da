//! Append-only audit storage.
//!
//! ```text
//! {root}/
//!   2026/
//!     10/
//!       18/
//!         {audit_id}.json
//! ```
//!
//! Day directories are zero-padded, so reverse lexical order is newest
//! first and a bounded listing can stop early. Every record is verified
//! against its seal on the way out; files that fail to parse or verify are
//! reported alongside the listing instead of aborting it.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use rxquery_core::OutcomeKind;

use crate::{AuditId, AuditRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no audit record with id {0}")]
    NotFound(AuditId),

    #[error("audit record {0} does not match its content hash")]
    Tampered(AuditId),

    #[error("refusing to store unsealed audit record {0}")]
    Unsealed(AuditId),

    #[error("audit record {0} already exists")]
    AlreadyExists(AuditId),

    #[error("audit store I/O: {0}")]
    Io(#[from] io::Error),

    #[error("audit record encoding: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub outcome: Option<OutcomeKind>,
    /// Keep at most this many records, newest first.
    pub limit: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        self.outcome.map_or(true, |o| record.outcome == o)
    }
}

/// A file that was left out of a listing.
#[derive(Debug)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Listing {
    /// Verified records, newest first.
    pub records: Vec<AuditRecord>,
    pub skipped: Vec<Skipped>,
}

pub trait AuditStore: Send + Sync {
    /// Persist a sealed record. Existing records are never overwritten.
    fn save(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Load one record, failing if it does not verify.
    fn get(&self, id: AuditId) -> Result<AuditRecord, StoreError>;

    fn list(&self, filter: &AuditFilter) -> Result<Listing, StoreError>;
}

pub struct FileAuditStore {
    root: PathBuf,
}

impl FileAuditStore {
    /// Open a store, creating the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn day_dir(&self, at: DateTime<Utc>) -> PathBuf {
        self.root.join(at.format("%Y/%m/%d").to_string())
    }

    fn days_newest_first(&self) -> io::Result<Vec<PathBuf>> {
        let mut days = Vec::new();
        for year in numbered_dirs(&self.root)? {
            for month in numbered_dirs(&year)? {
                days.extend(numbered_dirs(&month)?);
            }
        }
        days.sort_by(|a, b| b.cmp(a));
        Ok(days)
    }
}

impl AuditStore for FileAuditStore {
    fn save(&self, record: &AuditRecord) -> Result<(), StoreError> {
        if record.content_hash.is_none() {
            return Err(StoreError::Unsealed(record.id));
        }

        let dir = self.day_dir(record.started_at);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.json", record.id));

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(record.id));
            }
            Err(e) => return Err(e.into()),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)?;
        writer.flush()?;

        tracing::debug!(audit_id = %record.id, path = %path.display(), "Audit record written");
        Ok(())
    }

    fn get(&self, id: AuditId) -> Result<AuditRecord, StoreError> {
        let name = format!("{id}.json");
        for day in self.days_newest_first()? {
            let path = day.join(&name);
            if !path.is_file() {
                continue;
            }
            let record = read_record(&path)?;
            if record.id != id || !record.verify_integrity() {
                return Err(StoreError::Tampered(id));
            }
            return Ok(record);
        }
        Err(StoreError::NotFound(id))
    }

    fn list(&self, filter: &AuditFilter) -> Result<Listing, StoreError> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut listing = Listing::default();

        for day in self.days_newest_first()? {
            if listing.records.len() >= limit {
                break;
            }

            let mut day_records = Vec::new();
            for entry in fs::read_dir(&day)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match read_record(&path) {
                    Ok(record) if !record.verify_integrity() => {
                        listing.skip(path, "content hash mismatch".to_string());
                    }
                    Ok(record) => {
                        if filter.matches(&record) {
                            day_records.push(record);
                        }
                    }
                    Err(e) => listing.skip(path, e.to_string()),
                }
            }

            day_records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            listing.records.extend(day_records);
        }

        listing.records.truncate(limit);
        Ok(listing)
    }
}

impl Listing {
    fn skip(&mut self, path: PathBuf, reason: String) {
        tracing::warn!(path = %path.display(), reason = %reason, "Skipping audit file");
        self.skipped.push(Skipped { path, reason });
    }
}

fn read_record(path: &Path) -> Result<AuditRecord, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Subdirectories whose names are all digits (years, months, days).
fn numbered_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let numbered = entry
            .file_name()
            .to_str()
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
        if numbered && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
