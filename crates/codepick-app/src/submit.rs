use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use codepick_core::catalog::find_code;
use codepick_core::entry::CodeEntry;
use codepick_core::selection::{MergeReport, SelectionStore, StoreOutcome};
use codepick_core::submission::{BillingReport, SubmissionReceipt, SubmitError};
use thiserror::Error;

use crate::App;
use crate::generation::GenerationUpdate;

/// `CODE` or `CODE:QTY` as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpec {
    pub code: String,
    pub quantity: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeSpecError {
    #[error("code must not be empty")]
    EmptyCode,
    #[error("invalid quantity '{value}' for code {code}")]
    InvalidQuantity { code: String, value: String },
}

impl FromStr for CodeSpec {
    type Err = CodeSpecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (code, quantity) = match value.rsplit_once(':') {
            Some((code, raw)) => {
                let code = code.trim();
                let quantity =
                    raw.trim()
                        .parse::<i64>()
                        .map_err(|_| CodeSpecError::InvalidQuantity {
                            code: code.to_string(),
                            value: raw.to_string(),
                        })?;
                (code, quantity)
            }
            None => (value.trim(), 1),
        };

        if code.is_empty() {
            return Err(CodeSpecError::EmptyCode);
        }

        Ok(Self {
            code: code.to_string(),
            quantity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestResult {
    pub store: SelectionStore,
    pub merged: MergeReport,
}

impl App {
    pub fn submit(&self, report: &str, store: &SelectionStore) -> Result<SubmissionReceipt> {
        let billing = match BillingReport::from_selection(report, store) {
            Ok(billing) => billing,
            Err(SubmitError::EmptySelection) => return Err(SubmitError::EmptySelection.into()),
            Err(error) => return Err(error).context("failed to assemble billing report"),
        };

        self.sink
            .submit(&billing)
            .context("failed to submit billing report")
    }

    /// Builds a selection from explicit codes, taking names from the catalog
    /// when it knows the code. Repeated codes keep their first quantity.
    pub fn selection_from_specs(&self, specs: &[CodeSpec]) -> SelectionStore {
        let mut store = SelectionStore::new();

        for spec in specs {
            let entry = match find_code(self.catalog.as_ref(), &spec.code) {
                Some(found) => CodeEntry::from_match(found),
                None => {
                    tracing::warn!(code = %spec.code, "code not found in catalog");
                    CodeEntry::user_added(spec.code.clone(), spec.code.clone(), None)
                }
            }
            .with_quantity(spec.quantity);

            if let StoreOutcome::Ignored(reason) = store.add(entry) {
                tracing::warn!(code = %spec.code, %reason, "ignored code argument");
            }
        }

        store
    }

    /// Runs one generation to completion on the calling thread.
    pub fn suggest(&self, report: &str) -> Result<SuggestResult> {
        let mut store = SelectionStore::new();
        let mut session = self.generation_session();
        session.start(report);

        // One second of slack so the engine's own timeout reports first.
        let timeout = self.config.engine.timeout() + Duration::from_secs(1);
        match session.wait(&mut store, timeout) {
            Some(GenerationUpdate::Succeeded { merged, .. }) => Ok(SuggestResult { store, merged }),
            Some(GenerationUpdate::Failed { message, .. }) => {
                bail!("generation failed: {message}")
            }
            Some(GenerationUpdate::Stale { .. }) | None => {
                session.cancel();
                bail!(
                    "generation did not finish within {} seconds",
                    timeout.as_secs()
                )
            }
        }
    }
}
