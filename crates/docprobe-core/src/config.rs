//! Injected configuration for the probe pipeline.
//!
//! Every constant the pipeline depends on (URL templates, seed ids, noise patterns, hyphen
//! layouts) lives here with a default, so callers and tests can substitute their own.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Known-good document ids, used as seeds.
pub const KNOWN_IDS: [&str; 3] = [
    "11ql80LUVCpuk-tyW0oZ0Pf-v0NmEbXuC5115fSAX-io",
    "1ctvfdHRoRxdH87W7GlfKqQWOn0PbtrMjToHvD0x7DQc",
    "1kWuNeZzDg01f6nWDmFvpUdT646HZJxrSIJ7F8pwf0po",
];

/// Tried in order; `{}` is replaced by the document id.
pub const DEFAULT_URL_TEMPLATES: [&str; 3] = [
    "https://docs.google.com/document/d/{}/edit",
    "https://docs.google.com/document/d/{}/export?format=txt",
    "https://docs.google.com/document/d/{}/pub",
];

pub const ID_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub url_templates: Vec<String>,
    pub known_ids: Vec<String>,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Cap on bytes read per response body.
    pub max_bytes: u64,
    /// Max chars kept in `content_preview` before the `...` marker.
    pub preview_chars: usize,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            url_templates: DEFAULT_URL_TEMPLATES.iter().map(|s| s.to_string()).collect(),
            known_ids: KNOWN_IDS.iter().map(|s| s.to_string()).collect(),
            timeout_ms: 10_000,
            max_bytes: 5_000_000,
            preview_chars: 200,
            user_agent: "docprobe/0.1".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn url_for(template: &str, id: &str) -> String {
        template.replacen(ID_PLACEHOLDER, id, 1)
    }

    pub fn urls_for(&self, id: &str) -> Vec<String> {
        self.url_templates
            .iter()
            .map(|t| Self::url_for(t, id))
            .collect()
    }

    /// Checks that every template carries the id placeholder and expands to a valid URL.
    pub fn validate(&self) -> Result<()> {
        for t in &self.url_templates {
            if !t.contains(ID_PLACEHOLDER) {
                return Err(Error::InvalidConfig(format!(
                    "url template has no {ID_PLACEHOLDER} placeholder: {t}"
                )));
            }
            let sample = Self::url_for(t, "sample-id");
            url::Url::parse(&sample).map_err(|e| Error::InvalidUrl(format!("{t}: {e}")))?;
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidConfig("timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Expected id length; structural candidates of other lengths are discarded.
    pub canonical_len: usize,
    /// Hyphen positions observed in known-good ids. An empty layout means "no hyphens".
    pub hyphen_layouts: Vec<Vec<usize>>,
    pub last_char_span: u32,
    pub last_digit_span: u32,
    pub last_letter_span: u32,
    pub position_span: u32,
    /// Total candidate budget for `pattern_based`, split evenly over its four sub-heuristics.
    pub pattern_budget: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            canonical_len: 44,
            hyphen_layouts: vec![vec![13, 23, 41], vec![]],
            last_char_span: 5,
            last_digit_span: 10,
            last_letter_span: 5,
            position_span: 2,
            pattern_budget: 20,
        }
    }
}

/// Noise removed from every canonical text.
pub const COMMON_NOISE: [&str; 5] = [
    r"Loading\.\.\.",
    r"Sign in.*?Google",
    r"Last edit was.*?ago",
    r"\d{1,2}:\d{2}:\d{2}\s*(AM|PM)",
    r"Page \d+ of \d+",
];

/// Extra noise only seen when the raw page is handled without an HTML parser:
/// inline script residue and per-request query parameters.
pub const FALLBACK_NOISE: [&str; 7] = [
    r"var DOCS_timing.*?;",
    r#"nonce="[^"]*""#,
    r#"sid=[^&"]*"#,
    r"DOCS_timing\[.*?\].*?;",
    r"new Date\(\)\.getTime\(\)",
    r#"_reqid=[^&"]*"#,
    r#"authuser=[^&"]*"#,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub common_noise: Vec<String>,
    pub fallback_noise: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            common_noise: COMMON_NOISE.iter().map(|s| s.to_string()).collect(),
            fallback_noise: FALLBACK_NOISE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ProbeConfig::default().validate().unwrap();
    }

    #[test]
    fn urls_expand_in_template_order() {
        let cfg = ProbeConfig::default();
        let urls = cfg.urls_for("abc");
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], "https://docs.google.com/document/d/abc/edit");
        assert_eq!(
            urls[1],
            "https://docs.google.com/document/d/abc/export?format=txt"
        );
        assert_eq!(urls[2], "https://docs.google.com/document/d/abc/pub");
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let cfg = ProbeConfig {
            url_templates: vec!["https://example.com/doc".to_string()],
            ..ProbeConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let cfg = ProbeConfig::from_json(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(cfg.timeout_ms, 250);
        assert_eq!(cfg.preview_chars, 200);
        assert_eq!(cfg.known_ids.len(), KNOWN_IDS.len());
    }

    #[test]
    fn from_json_rejects_bad_templates() {
        let err = ProbeConfig::from_json(r#"{"url_templates": ["not a url {}"]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)), "err={err}");
    }
}
