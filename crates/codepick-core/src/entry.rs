use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    AiSuggested,
    UserAdded,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Self::AiSuggested => "AI",
            Self::UserAdded => "manual",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AiSuggested => write!(f, "AI_SUGGESTED"),
            Self::UserAdded => write!(f, "USER_ADDED"),
        }
    }
}

/// One billing-code line item in a selection.
///
/// `origin` and `rationale` are fixed at construction; the only mutable
/// property is `quantity`, and it never drops below 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    code: String,
    name: String,
    description: Option<String>,
    quantity: u32,
    origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    rationale: Option<String>,
}

impl CodeEntry {
    pub fn user_added(
        code: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description,
            quantity: 1,
            origin: Origin::UserAdded,
            rationale: None,
        }
    }

    pub fn from_candidate(candidate: CandidateCode) -> Self {
        let name = candidate.display_name().to_string();
        Self {
            code: candidate.code,
            name,
            description: candidate.description,
            quantity: 1,
            origin: Origin::AiSuggested,
            rationale: candidate.rationale,
        }
    }

    pub fn from_match(found: CatalogMatch) -> Self {
        Self::user_added(found.code, found.name, found.description)
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = clamp_quantity(quantity);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }
}

pub fn clamp_quantity(value: i64) -> u32 {
    value.clamp(1, i64::from(u32::MAX)) as u32
}

/// A code proposed by the generation engine, normalized from the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCode {
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub rationale: Option<String>,
}

impl CandidateCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            description: None,
            rationale: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or(self.code.as_str())
    }
}

/// A row returned by the code catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogMatch {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_entry_starts_ai_suggested_with_single_unit() {
        let entry = CodeEntry::from_candidate(
            CandidateCode::new("09543")
                .with_description("Signal exam")
                .with_rationale("documented in report"),
        );

        assert_eq!(entry.code(), "09543");
        assert_eq!(entry.name(), "Signal exam");
        assert_eq!(entry.quantity(), 1);
        assert_eq!(entry.origin(), Origin::AiSuggested);
        assert_eq!(entry.rationale(), Some("documented in report"));
    }

    #[test]
    fn candidate_name_falls_back_to_code() {
        let candidate = CandidateCode::new("42022");
        assert_eq!(candidate.display_name(), "42022");
    }

    #[test]
    fn catalog_match_becomes_user_added_entry() {
        let entry = CodeEntry::from_match(CatalogMatch {
            code: "A1".to_string(),
            name: "Visit".to_string(),
            description: None,
        });

        assert_eq!(entry.origin(), Origin::UserAdded);
        assert_eq!(entry.rationale(), None);
        assert_eq!(entry.quantity(), 1);
    }

    #[test]
    fn clamp_quantity_floors_at_one() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(-7), 1);
        assert_eq!(clamp_quantity(4), 4);
        assert_eq!(clamp_quantity(i64::MAX), u32::MAX);
    }

    #[test]
    fn origin_serializes_as_screaming_snake_case() {
        let raw = serde_json::to_string(&Origin::AiSuggested).expect("serialize origin");
        assert_eq!(raw, "\"AI_SUGGESTED\"");
    }
}
