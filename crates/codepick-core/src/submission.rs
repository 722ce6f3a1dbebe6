use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::config::{SinkKind, SubmitConfig};
use crate::entry::CodeEntry;
use crate::selection::SelectionStore;

const EXCERPT_CHARS: usize = 200;
const MAX_NAME_ATTEMPTS: u32 = 100;
const FILE_STEM_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year][month][day]T[hour][minute][second][subsecond digits:3]Z");

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("cannot submit an empty selection")]
    EmptySelection,
    #[error("failed to format submission timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("failed to encode billing report: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("submission output directory {path} is not usable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write billing report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingReport {
    pub report_excerpt: String,
    pub entries: Vec<CodeEntry>,
    pub submitted_at: String,
    #[serde(skip)]
    file_stem: String,
}

impl BillingReport {
    pub fn from_selection(report: &str, store: &SelectionStore) -> Result<Self, SubmitError> {
        Self::at(report, store, OffsetDateTime::now_utc())
    }

    pub fn at(
        report: &str,
        store: &SelectionStore,
        now: OffsetDateTime,
    ) -> Result<Self, SubmitError> {
        if store.is_empty() {
            return Err(SubmitError::EmptySelection);
        }

        let now = now.to_offset(UtcOffset::UTC);
        Ok(Self {
            report_excerpt: excerpt(report),
            entries: store.snapshot(),
            submitted_at: now.format(&Rfc3339)?,
            file_stem: now.format(FILE_STEM_FORMAT)?,
        })
    }

    pub fn total_units(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.quantity()))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionReceipt {
    Logged,
    Written(PathBuf),
}

pub trait SubmissionSink: Send + Sync {
    fn submit(&self, report: &BillingReport) -> Result<SubmissionReceipt, SubmitError>;
}

pub fn sink_from_config(config: &SubmitConfig) -> Box<dyn SubmissionSink> {
    match (config.sink, config.output_dir.as_ref()) {
        (SinkKind::Directory, Some(dir)) => Box::new(DirectorySink::new(dir.clone())),
        _ => Box::new(LogSink),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl SubmissionSink for LogSink {
    fn submit(&self, report: &BillingReport) -> Result<SubmissionReceipt, SubmitError> {
        tracing::info!(
            entries = report.entries.len(),
            units = report.total_units(),
            submitted_at = %report.submitted_at,
            "billing report submitted"
        );
        Ok(SubmissionReceipt::Logged)
    }
}

/// Writes each report as pretty JSON into `dir`. Existing files are never
/// overwritten; a numeric suffix is added instead.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SubmissionSink for DirectorySink {
    fn submit(&self, report: &BillingReport) -> Result<SubmissionReceipt, SubmitError> {
        fs::create_dir_all(&self.dir).map_err(|source| SubmitError::OutputDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut payload = serde_json::to_vec_pretty(report).map_err(SubmitError::Encode)?;
        payload.push(b'\n');

        let base = &report.file_stem;
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{base}.json")
            } else {
                format!("{base}-{attempt}.json")
            };
            let path = self.dir.join(file_name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(error) if error.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(SubmitError::Write { path, source }),
            };

            file.write_all(&payload)
                .map_err(|source| SubmitError::Write {
                    path: path.clone(),
                    source,
                })?;

            tracing::info!(path = %path.display(), entries = report.entries.len(), "billing report written");
            return Ok(SubmissionReceipt::Written(path));
        }

        Err(SubmitError::Write {
            path: self.dir.join(format!("{base}.json")),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
        })
    }
}

fn excerpt(report: &str) -> String {
    let trimmed = report.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }

    let mut out: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}
