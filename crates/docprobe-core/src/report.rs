use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of probing one id across all URL templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentProbeResult {
    pub id: String,
    /// The URL that succeeded, or the last one attempted.
    pub url: String,
    pub accessible: bool,
    pub title: Option<String>,
    pub content_preview: Option<String>,
    /// SHA-256 hex digest of the normalized content.
    pub content_hash: Option<String>,
    pub error: Option<String>,
}

impl DocumentProbeResult {
    pub fn unreached(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: String::new(),
            accessible: false,
            title: None,
            content_preview: None,
            content_hash: None,
            error: None,
        }
    }
}

/// Why a single template attempt did not yield a document.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("Access forbidden - document may be private")]
    Forbidden,
    #[error("Document not found")]
    NotFound,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Request failed: {0}")]
    Transport(String),
}

impl ProbeFailure {
    pub fn from_status(status: u16) -> Self {
        match status {
            403 => ProbeFailure::Forbidden,
            404 => ProbeFailure::NotFound,
            other => ProbeFailure::Status(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub consecutive_digits: Vec<String>,
    pub consecutive_letters: Vec<String>,
    /// Every `-` / `_` occurrence, in order.
    pub special_chars: Vec<String>,
    /// Char index of every separator.
    pub separator_positions: Vec<usize>,
    pub alternating_pattern: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdStructureReport {
    /// Length in chars.
    pub length: usize,
    pub character_counts: BTreeMap<char, usize>,
    pub has_hyphens: bool,
    pub has_underscores: bool,
    pub alphanumeric_only: bool,
    pub starts_with_digit: bool,
    pub pattern_analysis: PatternReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniquenessReport {
    pub total_tested: usize,
    pub accessible_count: usize,
    pub unique_count: usize,
    pub duplicate_count: usize,
    /// `unique_count / accessible_count`, or 0.0 when nothing was accessible.
    pub uniqueness_rate: f64,
    /// Distinct fingerprints in first-seen order.
    pub unique_hashes: Vec<String>,
}

/// Summary of a mutate -> probe -> dedupe run from one seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub base_id: String,
    pub strategies: Vec<Strategy>,
    pub total_tested: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub success_rate: f64,
    pub unique_documents_count: usize,
    pub duplicate_documents_count: usize,
    pub uniqueness_rate: f64,
    pub successful_documents: Vec<DocumentProbeResult>,
    pub failed_documents: Vec<DocumentProbeResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_failure_messages() {
        assert_eq!(
            ProbeFailure::from_status(403).to_string(),
            "Access forbidden - document may be private"
        );
        assert_eq!(
            ProbeFailure::from_status(404).to_string(),
            "Document not found"
        );
        assert_eq!(ProbeFailure::from_status(500).to_string(), "HTTP 500");
        assert_eq!(
            ProbeFailure::Transport("connection refused".into()).to_string(),
            "Request failed: connection refused"
        );
    }

    #[test]
    fn structure_report_serializes_histogram_in_char_order() {
        let mut r = IdStructureReport::default();
        r.character_counts.insert('b', 1);
        r.character_counts.insert('a', 2);
        let v = serde_json::to_value(&r).unwrap();
        let keys: Vec<_> = v["character_counts"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
