//! Sequential, throttled probing of candidate ids.
//!
//! Probes never run concurrently: each id is fully probed (every URL template tried until one
//! succeeds) before the next starts, and the batch sleeps between ids.

use crate::mutate::IdMutationEngine;
use crate::normalize::{self, ContentNormalizer};
use crate::uniqueness;
use crate::{LocalFetcher, TokioSleeper};
use docprobe_core::{
    DocumentProbeResult, FetchBackend, FetchRequest, ProbeConfig, ProbeFailure, Result, Sleeper,
    Strategy, SweepReport,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

pub struct ProbeRunner {
    fetcher: Arc<dyn FetchBackend>,
    sleeper: Arc<dyn Sleeper>,
    cfg: ProbeConfig,
    normalizer: ContentNormalizer,
    mutator: IdMutationEngine,
}

/// Non-positive and NaN delays collapse to zero; delays too large for a `Duration` saturate.
fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

impl ProbeRunner {
    pub fn new(
        fetcher: Arc<dyn FetchBackend>,
        sleeper: Arc<dyn Sleeper>,
        cfg: ProbeConfig,
        normalizer: ContentNormalizer,
        mutator: IdMutationEngine,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            cfg,
            normalizer,
            mutator,
        }
    }

    /// Real network + real sleeps, default normalizer and mutation rules.
    pub fn local(cfg: ProbeConfig) -> Result<Self> {
        cfg.validate()?;
        let fetcher = LocalFetcher::new(&cfg.user_agent)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(TokioSleeper),
            cfg,
            ContentNormalizer::default(),
            IdMutationEngine::default(),
        ))
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.cfg
    }

    pub fn mutator(&self) -> &IdMutationEngine {
        &self.mutator
    }

    pub fn normalizer(&self) -> &ContentNormalizer {
        &self.normalizer
    }

    fn request(&self, url: String) -> FetchRequest {
        FetchRequest {
            url,
            timeout_ms: Some(self.cfg.timeout_ms),
            max_bytes: Some(self.cfg.max_bytes),
            headers: BTreeMap::new(),
        }
    }

    /// Tries each URL template in order until one returns 2xx.
    ///
    /// On exhaustion `url` holds the last URL attempted and `error` the last failure.
    pub async fn probe_one(&self, id: &str) -> DocumentProbeResult {
        let mut out = DocumentProbeResult::unreached(id);
        for url in self.cfg.urls_for(id) {
            out.url = url.clone();
            let failure = match self.fetcher.fetch(&self.request(url)).await {
                Ok(resp) if resp.is_success() => {
                    let body = resp.text_lossy();
                    out.accessible = true;
                    out.title = normalize::page_title(&body);
                    out.content_preview = Some(normalize::preview(&body, self.cfg.preview_chars));
                    out.content_hash = Some(self.normalizer.fingerprint(&body));
                    out.error = None;
                    tracing::info!(id, url = %out.url, "document accessible");
                    return out;
                }
                Ok(resp) => ProbeFailure::from_status(resp.status),
                Err(e) => {
                    tracing::warn!(id, url = %out.url, error = %e, "fetch failed");
                    ProbeFailure::Transport(e.to_string())
                }
            };
            tracing::debug!(id, url = %out.url, %failure, "template attempt failed");
            out.error = Some(failure.to_string());
        }
        out
    }

    /// Probes `ids` one after another, in order, sleeping `delay_seconds` between probes
    /// (not after the last one). Every id is probed; duplicates are only logged.
    pub async fn probe_batch<S: AsRef<str>>(
        &self,
        ids: &[S],
        delay_seconds: f64,
    ) -> Vec<DocumentProbeResult> {
        let delay = delay_from_secs(delay_seconds);
        let total = ids.len();
        let mut results = Vec::with_capacity(total);
        let mut seen_hashes: HashSet<String> = HashSet::new();

        for (i, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            tracing::info!("probing document {}/{}: {}", i + 1, total, id);
            let result = self.probe_one(id).await;

            if let Some(hash) = result.content_hash.as_deref().filter(|_| result.accessible) {
                if seen_hashes.insert(hash.to_string()) {
                    tracing::info!(id, hash = &hash[..hash.len().min(8)], "unique document");
                } else {
                    tracing::info!(id, "duplicate document (same content as an earlier id)");
                }
            }
            results.push(result);

            if i + 1 < total {
                self.sleeper.sleep(delay).await;
            }
        }

        tracing::info!(
            tested = results.len(),
            unique = seen_hashes.len(),
            "batch complete"
        );
        results
    }

    pub async fn probe_known(&self, delay_seconds: f64) -> Vec<DocumentProbeResult> {
        self.probe_batch(self.cfg.known_ids.as_slice(), delay_seconds).await
    }

    /// Mutates `seed`, probes the first `max_increments` candidates and summarizes the hits.
    pub async fn sweep(
        &self,
        seed: &str,
        strategies: &[Strategy],
        max_increments: usize,
        delay_seconds: f64,
    ) -> SweepReport {
        let mut candidates = self.mutator.mutate(seed, strategies);
        candidates.truncate(max_increments);
        tracing::info!(
            seed,
            candidates = candidates.len(),
            "sweeping mutated ids"
        );

        let results = self.probe_batch(candidates.as_slice(), delay_seconds).await;
        let uniq = uniqueness::analyze(&results);
        let (successful, failed): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|r| r.accessible);

        let total = successful.len() + failed.len();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful.len() as f64 / total as f64
        };

        SweepReport {
            base_id: seed.to_string(),
            strategies: strategies.to_vec(),
            total_tested: total,
            successful_count: successful.len(),
            failed_count: failed.len(),
            success_rate,
            unique_documents_count: uniq.unique_count,
            duplicate_documents_count: uniq.duplicate_count,
            uniqueness_rate: uniq.uniqueness_rate,
            successful_documents: successful,
            failed_documents: failed,
        }
    }
}
