use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report {path} is empty")]
    Blank { path: PathBuf },
}

pub fn load_report(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read report {}", path.display()))
}

/// Loads a report that is about to be sent for generation.
pub fn ensure_report_ready(path: &Path) -> Result<String> {
    let text = load_report(path)?;
    if text.trim().is_empty() {
        return Err(ReportError::Blank {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(text)
}
