//! Canonical document text and content fingerprints.
//!
//! Two fetches of the same document rarely match byte for byte: timestamps, page counters,
//! sign-in banners and per-request tokens differ. The canonical text strips those so the
//! fingerprint (SHA-256 hex) can stand in for content equality.
//!
//! Extraction is an ordered chain; each step is total and the first one that produces text
//! wins:
//! - `structured`: HTML parse, preferring the document page container over page chrome.
//! - `regex`: tag stripping only, plus extra noise rules for script residue and query tokens.

use docprobe_core::{Error, NormalizerConfig, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in regex is valid")
}

static MARKUP: LazyLock<Regex> = LazyLock::new(|| re(r"<[A-Za-z!/][^>]*>"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<title>(.*?)</title>"));
static SCRIPT: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<script[^>]*>.*?</script>"));
static STYLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<style[^>]*>.*?</style>"));
static NOSCRIPT: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<noscript[^>]*>.*?</noscript>"));
static TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]+>"));

/// Page containers, most specific first. `body` and then the whole document are the fallbacks.
const MAIN_CONTAINERS: [&str; 4] = [
    r#"div[class*="kix-page"]"#,
    "div#contents",
    r#"div[class*="doc-content"]"#,
    "body",
];

const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

pub fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `<title>` in the raw page, trimmed. Empty titles count as absent.
pub fn page_title(raw: &str) -> Option<String> {
    let t = TITLE.captures(raw)?.get(1)?.as_str().trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Tag-stripped, whitespace-collapsed text, cut to `max_chars` with a `...` marker.
pub fn preview(raw: &str, max_chars: usize) -> String {
    let text = norm_ws(&TAG.replace_all(raw, ""));
    if text.chars().count() > max_chars {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    } else {
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalText {
    /// Which extraction step produced the text: `structured` or `regex`.
    pub engine: &'static str,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ContentNormalizer {
    common: Vec<Regex>,
    fallback: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| Error::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default()).expect("built-in noise patterns are valid")
    }
}

impl ContentNormalizer {
    pub fn new(cfg: NormalizerConfig) -> Result<Self> {
        Ok(Self {
            common: compile(&cfg.common_noise)?,
            fallback: compile(&cfg.fallback_noise)?,
        })
    }

    pub fn canonicalize(&self, raw: &str) -> CanonicalText {
        let (engine, extracted, noise) = match structured_text(raw) {
            Some(text) => ("structured", text, vec![&self.common]),
            None => ("regex", regex_text(raw), vec![&self.fallback, &self.common]),
        };
        let mut text = norm_ws(&extracted);
        for re in noise.into_iter().flatten() {
            text = re.replace_all(&text, "").into_owned();
        }
        CanonicalText {
            engine,
            text: norm_ws(&text),
        }
    }

    pub fn canonical_text(&self, raw: &str) -> String {
        self.canonicalize(raw).text
    }

    /// Lowercase hex SHA-256 of the canonical text.
    pub fn fingerprint(&self, raw: &str) -> String {
        let mut h = Sha256::new();
        h.update(self.canonical_text(raw).as_bytes());
        hex::encode(h.finalize())
    }
}

/// `None` when the input carries no markup, or when the parser blew up.
fn structured_text(raw: &str) -> Option<String> {
    if !MARKUP.is_match(raw) {
        return None;
    }
    match std::panic::catch_unwind(|| parse_structured(raw)) {
        Ok(text) => Some(text),
        Err(_) => {
            tracing::warn!("html extraction panicked; falling back to regex extraction");
            None
        }
    }
}

fn parse_structured(raw: &str) -> String {
    let doc = html_scraper::Html::parse_document(raw);

    let title = html_scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let main = MAIN_CONTAINERS
        .iter()
        .filter_map(|css| html_scraper::Selector::parse(css).ok())
        .filter_map(|sel| doc.select(&sel).next().map(visible_text))
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| visible_text(doc.root_element()));

    format!("{title}\n{main}")
}

/// Trimmed text nodes joined by single spaces, skipping script/style/noscript content.
fn visible_text(el: html_scraper::ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in el.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let t = text.trim();
        if !t.is_empty() {
            parts.push(t);
        }
    }
    parts.join(" ")
}

fn regex_text(raw: &str) -> String {
    let title = TITLE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("");
    let s = SCRIPT.replace_all(raw, "");
    let s = STYLE.replace_all(&s, "");
    let s = NOSCRIPT.replace_all(&s, "");
    let body = TAG.replace_all(&s, "");
    format!("{title}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fp(raw: &str) -> String {
        ContentNormalizer::default().fingerprint(raw)
    }

    fn canon(raw: &str) -> CanonicalText {
        ContentNormalizer::default().canonicalize(raw)
    }

    #[test]
    fn page_footer_does_not_change_fingerprint() {
        let a = "<title>Doc</title><body>Page 1 of 5 Hello World</body>";
        let b = "<title>Doc</title><body>Page 2 of 5 Hello World</body>";
        assert_eq!(fp(a), fp(b));
        assert_eq!(canon(a).text, "Doc Hello World");
    }

    #[test]
    fn footer_and_timestamp_noise_normalize_away() {
        let a = "<html><body><p>Saved 2:15:07 PM</p><p>Body text</p><p>Page 3 of 10</p></body></html>";
        let b = "<html><body><p>Saved 11:02:59 AM</p><p>Body text</p><p>Page 4 of 10</p></body></html>";
        assert_eq!(fp(a), fp(b));
        assert_ne!(fp(a), fp("<html><body><p>Other text</p></body></html>"));
    }

    #[test]
    fn banners_and_placeholders_are_removed() {
        let raw = "<title>Plan</title><body>Sign in to continue to Google Loading... \
                   Last edit was 5 minutes ago Quarterly goals</body>";
        assert_eq!(canon(raw).text, "Plan Quarterly goals");
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let raw = "<title>Doc</title><body>Hello</body>";
        let a = fp(raw);
        assert_eq!(a, fp(raw));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn page_container_beats_page_chrome() {
        let raw = r#"<html><head><title>T</title></head><body>
            <div class="menu">File Edit View</div>
            <div class="kix-page kix-page-paginated"><p>Real</p><p>text</p></div>
            </body></html>"#;
        let c = canon(raw);
        assert_eq!(c.engine, "structured");
        assert_eq!(c.text, "T Real text");
    }

    #[test]
    fn contents_and_doc_content_containers_are_used() {
        let contents = r#"<body><nav>chrome</nav><div id="contents">Published body</div></body>"#;
        assert_eq!(canon(contents).text, "Published body");

        let doc_content =
            r#"<body><nav>chrome</nav><div class="doc-content x">Exported body</div></body>"#;
        assert_eq!(canon(doc_content).text, "Exported body");
    }

    #[test]
    fn scripts_and_styles_are_not_content() {
        let a = "<body><script>var t = 1;</script><style>p{}</style><p>Hi</p></body>";
        let b = "<body><script>var t = 2;</script><p>Hi</p></body>";
        assert_eq!(canon(a).text, "Hi");
        assert_eq!(fp(a), fp(b));
    }

    #[test]
    fn empty_page_container_falls_through_to_body() {
        let c = canon(r#"<title>T</title><div class="kix-page"></div><p>Real</p>"#);
        assert_eq!(c.engine, "structured");
        assert_eq!(c.text, "T Real");
    }

    #[test]
    fn empty_body_falls_back_to_whole_document() {
        let c = canon("<html><head><title>Only title</title></head><body></body></html>");
        assert_eq!(c.engine, "structured");
        assert_eq!(c.text, "Only title Only title");
    }

    #[test]
    fn plain_text_takes_the_regex_path_with_token_rules() {
        let a = canon("hello nonce=\"xyz\" world");
        assert_eq!(a.engine, "regex");
        assert_eq!(a.text, "hello world");
        assert_eq!(
            fp("open /d?sid=AAA&authuser=0&x=1 now"),
            fp("open /d?sid=BBB&authuser=3&x=1 now")
        );
        assert_eq!(
            fp("report var DOCS_timing = {}; body _reqid=42"),
            fp("report var DOCS_timing = {a: 1}; body _reqid=77")
        );
    }

    #[test]
    fn custom_noise_patterns_are_applied() {
        let mut cfg = NormalizerConfig::default();
        cfg.common_noise.push(r"Draft \d+".to_string());
        let n = ContentNormalizer::new(cfg).unwrap();
        assert_eq!(
            n.fingerprint("<body>Draft 1 Notes</body>"),
            n.fingerprint("<body>Draft 2 Notes</body>")
        );
    }

    #[test]
    fn invalid_noise_pattern_is_a_config_error() {
        let cfg = NormalizerConfig {
            common_noise: vec!["(unclosed".to_string()],
            fallback_noise: vec![],
        };
        let err = ContentNormalizer::new(cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }), "err={err}");
    }

    #[test]
    fn title_and_preview_helpers() {
        assert_eq!(page_title("<TITLE> Doc </TITLE>"), Some("Doc".to_string()));
        assert_eq!(page_title("<title></title>"), None);
        assert_eq!(page_title("no title"), None);

        let raw = format!("<p>{}</p>", "a".repeat(250));
        let p = preview(&raw, 200);
        assert_eq!(p.chars().count(), 203);
        assert!(p.ends_with("..."));
        assert_eq!(preview("<b>short</b>  text", 200), "short text");
    }

    proptest! {
        #[test]
        fn canonical_text_is_trimmed_and_single_spaced(raw in any::<String>()) {
            let c = ContentNormalizer::default().canonicalize(&raw);
            prop_assert_eq!(c.text.trim(), c.text.as_str());
            prop_assert!(!c.text.contains("  "));
            prop_assert!(!c.text.contains('\n'));
        }

        #[test]
        fn fingerprint_never_panics(raw in ".{0,400}") {
            let h = ContentNormalizer::default().fingerprint(&raw);
            prop_assert_eq!(h.len(), 64);
        }
    }
}
