use std::collections::HashSet;
use std::fmt;

use crate::entry::{CandidateCode, CodeEntry, clamp_quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    DuplicateCode,
    IndexOutOfRange,
    UnknownCode,
    QuantityFloor,
    QuantityCeiling,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCode => write!(f, "code is already selected"),
            Self::IndexOutOfRange => write!(f, "no entry at that position"),
            Self::UnknownCode => write!(f, "code is not selected"),
            Self::QuantityFloor => write!(f, "quantity cannot go below 1"),
            Self::QuantityCeiling => write!(f, "quantity is already at its maximum"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Applied,
    Ignored(IgnoredReason),
}

impl StoreOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub appended: usize,
    pub skipped_duplicates: usize,
}

/// Ordered set of selected codes, keyed by `code`.
///
/// Every mutation is total: operations that cannot apply leave the store
/// unchanged and report why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    entries: Vec<CodeEntry>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        self.entries.iter().find(|entry| entry.code() == code)
    }

    pub fn position(&self, code: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.code() == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }

    pub fn snapshot(&self) -> Vec<CodeEntry> {
        self.entries.clone()
    }

    pub fn total_units(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.quantity()))
            .sum()
    }

    pub fn add(&mut self, entry: CodeEntry) -> StoreOutcome {
        if self.contains(entry.code()) {
            tracing::debug!(code = entry.code(), "ignored add of duplicate code");
            return StoreOutcome::Ignored(IgnoredReason::DuplicateCode);
        }

        self.entries.push(entry);
        StoreOutcome::Applied
    }

    pub fn remove(&mut self, index: usize) -> StoreOutcome {
        if index >= self.entries.len() {
            tracing::debug!(index, len = self.entries.len(), "ignored remove out of range");
            return StoreOutcome::Ignored(IgnoredReason::IndexOutOfRange);
        }

        self.entries.remove(index);
        StoreOutcome::Applied
    }

    pub fn toggle(&mut self, code: &str) -> StoreOutcome {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.code() != code);

        if self.entries.len() == before {
            tracing::debug!(code, "ignored toggle of unselected code");
            return StoreOutcome::Ignored(IgnoredReason::UnknownCode);
        }

        StoreOutcome::Applied
    }

    pub fn set_quantity(&mut self, code: &str, new_quantity: i64) -> StoreOutcome {
        let quantity = clamp_quantity(new_quantity);
        let mut matched = false;

        for entry in self.entries.iter_mut().filter(|entry| entry.code() == code) {
            entry.set_quantity(quantity);
            matched = true;
        }

        if matched {
            StoreOutcome::Applied
        } else {
            tracing::debug!(code, "ignored quantity change for unselected code");
            StoreOutcome::Ignored(IgnoredReason::UnknownCode)
        }
    }

    pub fn increment(&mut self, code: &str) -> StoreOutcome {
        let Some(current) = self.get(code).map(CodeEntry::quantity) else {
            return StoreOutcome::Ignored(IgnoredReason::UnknownCode);
        };

        if current == u32::MAX {
            tracing::debug!(code, "ignored increment at maximum quantity");
            return StoreOutcome::Ignored(IgnoredReason::QuantityCeiling);
        }

        self.set_quantity(code, i64::from(current) + 1)
    }

    pub fn decrement(&mut self, code: &str) -> StoreOutcome {
        let Some(current) = self.get(code).map(CodeEntry::quantity) else {
            return StoreOutcome::Ignored(IgnoredReason::UnknownCode);
        };

        if current <= 1 {
            return StoreOutcome::Ignored(IgnoredReason::QuantityFloor);
        }

        self.set_quantity(code, i64::from(current) - 1)
    }

    /// Appends one AI-suggested entry per candidate, after whatever the
    /// store currently holds. Codes already present are skipped.
    pub fn merge_generated<I>(&mut self, candidates: I) -> MergeReport
    where
        I: IntoIterator<Item = CandidateCode>,
    {
        let mut seen: HashSet<String> = self
            .entries
            .iter()
            .map(|entry| entry.code().to_string())
            .collect();
        let mut report = MergeReport::default();

        for candidate in candidates {
            if !seen.insert(candidate.code.clone()) {
                report.skipped_duplicates += 1;
                continue;
            }

            self.entries.push(CodeEntry::from_candidate(candidate));
            report.appended += 1;
        }

        if report.skipped_duplicates > 0 {
            tracing::debug!(
                skipped = report.skipped_duplicates,
                "merge skipped codes that were already selected"
            );
        }

        report
    }
}
