use docprobe_core::{DocumentProbeResult, UniquenessReport};
use std::collections::HashSet;

/// Groups accessible results by fingerprint.
///
/// Accessible results without a fingerprint count toward `duplicate_count`, which keeps
/// `unique_count + duplicate_count == accessible_count`.
pub fn analyze(results: &[DocumentProbeResult]) -> UniquenessReport {
    let accessible: Vec<&DocumentProbeResult> = results.iter().filter(|r| r.accessible).collect();

    let mut seen = HashSet::new();
    let mut unique_hashes = Vec::new();
    for hash in accessible.iter().filter_map(|r| r.content_hash.as_deref()) {
        if seen.insert(hash) {
            unique_hashes.push(hash.to_string());
        }
    }

    let accessible_count = accessible.len();
    let unique_count = unique_hashes.len();
    let uniqueness_rate = if accessible_count == 0 {
        0.0
    } else {
        unique_count as f64 / accessible_count as f64
    };

    UniquenessReport {
        total_tested: results.len(),
        accessible_count,
        unique_count,
        duplicate_count: accessible_count - unique_count,
        uniqueness_rate,
        unique_hashes,
    }
}
