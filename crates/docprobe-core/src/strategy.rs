//! Named id-mutation heuristics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Bump the final character within its class.
    LastChar,
    /// Cycle the rightmost digit through 1..=10 offsets (mod 10).
    LastDigit,
    /// Bump the rightmost letter without wrapping.
    LastLetter,
    /// Bump every position by small offsets.
    AllPositions,
    /// Structural variations learned from known-good ids.
    PatternBased,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::LastChar,
        Strategy::LastDigit,
        Strategy::LastLetter,
        Strategy::AllPositions,
        Strategy::PatternBased,
    ];

    /// Cheap single-position strategies; the default for plain candidate generation.
    pub const DEFAULT_GENERATE: [Strategy; 3] =
        [Strategy::LastChar, Strategy::LastDigit, Strategy::LastLetter];

    /// Default for a generate-and-probe sweep.
    pub const DEFAULT_SWEEP: [Strategy; 4] = [
        Strategy::LastChar,
        Strategy::LastDigit,
        Strategy::LastLetter,
        Strategy::PatternBased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::LastChar => "last_char",
            Strategy::LastDigit => "last_digit",
            Strategy::LastLetter => "last_letter",
            Strategy::AllPositions => "all_positions",
            Strategy::PatternBased => "pattern_based",
        }
    }

    /// Lenient parse: unknown names are dropped, not reported.
    pub fn parse_lenient<I, S>(names: I) -> Vec<Strategy>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|n| n.as_ref().parse().ok())
            .collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}
