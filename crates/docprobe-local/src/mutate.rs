//! Candidate id generation from a known-working seed.
//!
//! Every strategy is deterministic. Per-class increments only touch ASCII digits and ASCII
//! letters: digits wrap mod 10, letters never wrap past `z`/`Z` (those candidates are dropped).

use docprobe_core::{MutationConfig, Strategy};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run regex is valid"));

#[derive(Debug, Clone, Default)]
pub struct IdMutationEngine {
    cfg: MutationConfig,
}

/// Shift `c` by `k` within its class, or `None` if the class does not allow it.
fn bump(c: char, k: u32) -> Option<char> {
    if c.is_ascii_digit() {
        let d = c.to_digit(10)?;
        return char::from_digit((d + k % 10) % 10, 10);
    }
    let ceiling = if c.is_ascii_lowercase() {
        'z'
    } else if c.is_ascii_uppercase() {
        'Z'
    } else {
        return None;
    };
    let shifted = (c as u32).checked_add(k)?;
    if shifted <= ceiling as u32 {
        char::from_u32(shifted)
    } else {
        None
    }
}

fn with_char_at(chars: &[char], pos: usize, c: char) -> String {
    let mut out: String = chars[..pos].iter().collect();
    out.push(c);
    out.extend(&chars[pos + 1..]);
    out
}

fn is_separator(c: char) -> bool {
    c == '-' || c == '_'
}

impl IdMutationEngine {
    pub fn new(cfg: MutationConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.cfg
    }

    /// Concatenates each strategy's candidates in order and drops repeats (first one wins).
    pub fn mutate(&self, seed: &str, strategies: &[Strategy]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for st in strategies {
            for cand in self.candidates(*st, seed) {
                if seen.insert(cand.clone()) {
                    out.push(cand);
                }
            }
        }
        out
    }

    /// Like [`mutate`](Self::mutate), taking strategy names. Unknown names are ignored.
    pub fn mutate_named<I, S>(&self, seed: &str, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mutate(seed, &Strategy::parse_lenient(names))
    }

    pub fn candidates(&self, strategy: Strategy, seed: &str) -> Vec<String> {
        let chars: Vec<char> = seed.chars().collect();
        match strategy {
            Strategy::LastChar => match chars.len().checked_sub(1) {
                Some(pos) => self.bump_at(&chars, pos, self.cfg.last_char_span),
                None => Vec::new(),
            },
            Strategy::LastDigit => match chars.iter().rposition(|c| c.is_ascii_digit()) {
                Some(pos) => self.bump_at(&chars, pos, self.cfg.last_digit_span),
                None => Vec::new(),
            },
            Strategy::LastLetter => match chars.iter().rposition(|c| c.is_alphabetic()) {
                Some(pos) => self.bump_at(&chars, pos, self.cfg.last_letter_span),
                None => Vec::new(),
            },
            Strategy::AllPositions => (0..chars.len())
                .flat_map(|pos| self.bump_at(&chars, pos, self.cfg.position_span))
                .collect(),
            Strategy::PatternBased => self.pattern_based(seed, &chars),
        }
    }

    fn bump_at(&self, chars: &[char], pos: usize, span: u32) -> Vec<String> {
        (1..=span)
            .filter_map(|k| bump(chars[pos], k))
            .map(|c| with_char_at(chars, pos, c))
            .collect()
    }

    fn pattern_based(&self, seed: &str, chars: &[char]) -> Vec<String> {
        let cap = self.cfg.pattern_budget / 4;
        let mut out = self.hyphen_layouts(chars, cap);
        out.extend(self.digit_runs(seed, cap));
        out.extend(self.segment_swaps(chars, cap));
        out.extend(self.length_variations(chars, cap));
        out
    }

    /// Re-hyphenates the stripped seed with each configured layout. Layout positions are
    /// indices in the final id, so they are inserted in ascending order.
    fn hyphen_layouts(&self, chars: &[char], cap: usize) -> Vec<String> {
        let stripped: Vec<char> = chars.iter().copied().filter(|c| *c != '-').collect();
        let mut out = Vec::new();
        for layout in &self.cfg.hyphen_layouts {
            let mut positions = layout.clone();
            positions.sort_unstable();
            positions.dedup();
            let mut v = stripped.clone();
            for pos in positions {
                if pos > v.len() {
                    break;
                }
                v.insert(pos, '-');
            }
            if v.len() == self.cfg.canonical_len {
                out.push(v.into_iter().collect());
            }
        }
        out.truncate(cap);
        out
    }

    /// Nudges each multi-digit run by -2..=+2 (clamped at zero, zero-padded to the run width).
    fn digit_runs(&self, seed: &str, cap: usize) -> Vec<String> {
        let mut out = Vec::new();
        for run in DIGIT_RUN.find_iter(seed) {
            let seq = run.as_str();
            if seq.len() < 2 {
                continue;
            }
            let Ok(num) = seq.parse::<u128>() else {
                continue;
            };
            for next in [
                num.saturating_sub(2),
                num.saturating_sub(1),
                num.saturating_add(1),
                num.saturating_add(2),
            ] {
                let replacement = format!("{next:0width$}", width = seq.len());
                let cand = seed.replacen(seq, &replacement, 1);
                if cand != seed {
                    out.push(cand);
                }
            }
        }
        out.truncate(cap);
        out
    }

    fn segment_swaps(&self, chars: &[char], cap: usize) -> Vec<String> {
        let mut out = Vec::new();
        for i in 0..chars.len().saturating_sub(1) {
            let (a, b) = (chars[i], chars[i + 1]);
            let boundary = (a.is_alphabetic() && b.is_ascii_digit())
                || (a.is_ascii_digit() && b.is_alphabetic());
            if boundary {
                let mut v = chars.to_vec();
                v.swap(i, i + 1);
                out.push(v.into_iter().collect());
            }
        }
        out.truncate(cap);
        out
    }

    /// Single-char deletions and duplications at evenly spaced positions, kept only when they
    /// land exactly one off the canonical length.
    fn length_variations(&self, chars: &[char], cap: usize) -> Vec<String> {
        let stride = match cap {
            0 => 0,
            n => chars.len() / n,
        };
        if stride == 0 {
            return Vec::new();
        }
        let shorter = self.cfg.canonical_len.checked_sub(1);
        let longer = self.cfg.canonical_len + 1;

        let mut out = Vec::new();
        for i in (0..chars.len()).step_by(stride) {
            if is_separator(chars[i]) {
                continue;
            }
            let mut v = chars.to_vec();
            v.remove(i);
            if Some(v.len()) == shorter {
                out.push(v.into_iter().collect());
            }
        }
        for i in (0..chars.len()).step_by(stride) {
            if !chars[i].is_alphanumeric() {
                continue;
            }
            let mut v = chars.to_vec();
            v.insert(i, chars[i]);
            if v.len() == longer {
                out.push(v.into_iter().collect());
            }
        }
        out.truncate(cap);
        out
    }
}
