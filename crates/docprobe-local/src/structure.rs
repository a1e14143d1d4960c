//! Structural features of a single document id.

use docprobe_core::{IdStructureReport, PatternReport};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run regex is valid"));
static LETTER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]+").expect("letter run regex is valid"));

fn is_separator(c: char) -> bool {
    c == '-' || c == '_'
}

/// Pure and total: any input, including `""`, yields a well-formed report.
pub fn analyze(id: &str) -> IdStructureReport {
    let mut character_counts = BTreeMap::new();
    for c in id.chars() {
        *character_counts.entry(c).or_insert(0usize) += 1;
    }

    let stripped: String = id.chars().filter(|c| !is_separator(*c)).collect();
    let alphanumeric_only = !stripped.is_empty() && stripped.chars().all(char::is_alphanumeric);

    IdStructureReport {
        length: id.chars().count(),
        character_counts,
        has_hyphens: id.contains('-'),
        has_underscores: id.contains('_'),
        alphanumeric_only,
        starts_with_digit: id.chars().next().is_some_and(|c| c.is_ascii_digit()),
        pattern_analysis: patterns(id),
    }
}

fn patterns(id: &str) -> PatternReport {
    let runs = |re: &Regex| -> Vec<String> {
        re.find_iter(id).map(|m| m.as_str().to_string()).collect()
    };
    let mut special_chars = Vec::new();
    let mut separator_positions = Vec::new();
    for (i, c) in id.chars().enumerate() {
        if is_separator(c) {
            special_chars.push(c.to_string());
            separator_positions.push(i);
        }
    }
    PatternReport {
        consecutive_digits: runs(&DIGIT_RUN),
        consecutive_letters: runs(&LETTER_RUN),
        special_chars,
        separator_positions,
        alternating_pattern: is_alternating(id),
    }
}

/// True when no two adjacent chars share a digit/non-digit class, ignoring pairs that start
/// at a separator.
fn is_alternating(id: &str) -> bool {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() < 2 {
        return false;
    }
    chars
        .windows(2)
        .all(|w| is_separator(w[0]) || w[0].is_ascii_digit() != w[1].is_ascii_digit())
}
