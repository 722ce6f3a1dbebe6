use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::{CatalogSource, MAX_LOOKUP_LIMIT};
use crate::engine::{code_to_string, non_blank, truncate_for_log};
use crate::entry::CatalogMatch;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("catalog request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("catalog returned invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to read catalog at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog line {line} in {path}: {source}")]
    Line {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub trait CatalogLookup: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogMatch>, CatalogError>;

    /// Exact match on `code`, independent of the search limit.
    fn find_code(&self, code: &str) -> Result<Option<CatalogMatch>, CatalogError>;
}

/// Result of a lookup as the rest of the system sees it: failures become an
/// empty match list plus a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupOutcome {
    pub matches: Vec<CatalogMatch>,
    pub error: Option<String>,
}

impl LookupOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            error: Some(message.into()),
        }
    }
}

pub fn lookup(catalog: &dyn CatalogLookup, query: &str, limit: usize) -> LookupOutcome {
    match catalog.search(query.trim(), limit) {
        Ok(mut matches) => {
            matches.truncate(limit);
            LookupOutcome {
                matches,
                error: None,
            }
        }
        Err(error) => {
            tracing::warn!(query, error = %error, "catalog lookup failed");
            LookupOutcome::failed(error.to_string())
        }
    }
}

/// Resolves one code exactly. Failures are logged and read as "not found".
pub fn find_code(catalog: &dyn CatalogLookup, code: &str) -> Option<CatalogMatch> {
    match catalog.find_code(code.trim()) {
        Ok(found) => found,
        Err(error) => {
            tracing::warn!(code, error = %error, "catalog code lookup failed");
            None
        }
    }
}

pub fn open_catalog(source: &CatalogSource) -> Result<Box<dyn CatalogLookup>, CatalogError> {
    match source {
        CatalogSource::Http { url, timeout } => {
            Ok(Box::new(HttpCatalog::new(url.clone(), *timeout)?))
        }
        CatalogSource::File { path } => Ok(Box::new(FileCatalog::open(path)?)),
    }
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    code: Value,
    name: Option<String>,
    description: Option<String>,
}

impl WireMatch {
    fn into_match(self) -> Option<CatalogMatch> {
        let code = code_to_string(&self.code)?;
        let description = non_blank(self.description);
        let name = non_blank(self.name)
            .or_else(|| description.clone())
            .unwrap_or_else(|| code.clone());
        Some(CatalogMatch {
            code,
            name,
            description,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<WireMatch>,
}

pub struct HttpCatalog {
    client: Client,
    url: String,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CatalogError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl CatalogLookup for HttpCatalog {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogMatch>, CatalogError> {
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[("query", query), ("limit", limit_param.as_str())])
            .send()
            .map_err(|source| CatalogError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| CatalogError::Request {
            url: self.url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body),
            });
        }

        parse_search_response(&body, limit)
    }

    fn find_code(&self, code: &str) -> Result<Option<CatalogMatch>, CatalogError> {
        Ok(self
            .search(code, MAX_LOOKUP_LIMIT)?
            .into_iter()
            .find(|row| row.code == code))
    }
}

pub fn parse_search_response(body: &str, limit: usize) -> Result<Vec<CatalogMatch>, CatalogError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(CatalogError::Decode)?;
    Ok(response
        .result
        .into_iter()
        .filter_map(WireMatch::into_match)
        .take(limit)
        .collect())
}

/// JSON-lines catalog held in memory. One object per line; blank lines are
/// skipped.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    rows: Vec<CatalogMatch>,
}

impl FileCatalog {
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut rows = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let wire: WireMatch =
                serde_json::from_str(line).map_err(|source| CatalogError::Line {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })?;
            if let Some(row) = wire.into_match() {
                rows.push(row);
            }
        }

        tracing::debug!(path = %path.display(), rows = rows.len(), "loaded file catalog");
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<CatalogMatch>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl CatalogLookup for FileCatalog {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogMatch>, CatalogError> {
        let query = query.trim().to_lowercase();
        Ok(self
            .rows
            .iter()
            .filter(|row| {
                if query.is_empty() {
                    return true;
                }

                row.code.to_lowercase().contains(&query)
                    || row.name.to_lowercase().contains(&query)
                    || row
                        .description
                        .as_deref()
                        .is_some_and(|text| text.to_lowercase().contains(&query))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn find_code(&self, code: &str) -> Result<Option<CatalogMatch>, CatalogError> {
        Ok(self.rows.iter().find(|row| row.code == code).cloned())
    }
}
