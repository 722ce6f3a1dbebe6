use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entry::CandidateCode;

const BODY_LOG_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("generation request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generation engine returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("generation engine returned invalid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Produces candidate codes for one report. Implementations block until the
/// engine answers; callers run them off the input thread.
pub trait GenerationEngine: Send + Sync {
    fn generate(&self, report: &str) -> Result<Vec<CandidateCode>, EngineError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    report: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    diagnosis: Option<Diagnosis>,
}

/// `vykony` is the older name for `codes`; `codes` wins when both are sent.
#[derive(Debug, Deserialize)]
struct Diagnosis {
    codes: Option<Vec<WireCode>>,
    vykony: Option<Vec<WireCode>>,
}

impl Diagnosis {
    fn into_codes(self) -> Vec<WireCode> {
        self.codes.or(self.vykony).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct WireCode {
    code: Value,
    name: Option<String>,
    description: Option<String>,
    explanation: Option<String>,
}

pub struct HttpGenerationEngine {
    client: Client,
    url: String,
}

impl HttpGenerationEngine {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(EngineError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl GenerationEngine for HttpGenerationEngine {
    fn generate(&self, report: &str) -> Result<Vec<CandidateCode>, EngineError> {
        tracing::debug!(url = %self.url, report_len = report.len(), "sending generation request");

        let response = self
            .client
            .post(&self.url)
            .json(&GenerationRequest { report })
            .send()
            .map_err(|source| EngineError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| EngineError::Request {
            url: self.url.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(EngineError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body),
            });
        }

        parse_generation_response(&body)
    }
}

/// Decodes an engine response body. A missing `diagnosis` yields no
/// candidates; codes may be numbers or strings and blank codes are dropped.
pub fn parse_generation_response(body: &str) -> Result<Vec<CandidateCode>, EngineError> {
    let response: GenerationResponse = serde_json::from_str(body).map_err(EngineError::Decode)?;
    let Some(diagnosis) = response.diagnosis else {
        return Ok(Vec::new());
    };

    Ok(diagnosis
        .into_codes()
        .into_iter()
        .filter_map(|wire| {
            let code = code_to_string(&wire.code)?;
            Some(CandidateCode {
                code,
                name: non_blank(wire.name),
                description: non_blank(wire.description),
                rationale: non_blank(wire.explanation),
            })
        })
        .collect())
}

pub(crate) fn code_to_string(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    if raw.is_empty() { None } else { Some(raw) }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub(crate) fn truncate_for_log(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_LOG_LIMIT {
        return trimmed.to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_LOG_LIMIT).collect();
    out.push_str("...");
    out
}
