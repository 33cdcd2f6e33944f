use chrono::{DateTime, Utc};
use common::config::Scan;
use common::polymarket::ActivityQuery;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::fetcher_traits::ActivitySource;
use crate::forensics::{fetch_wallet_forensics, FetchFailure, FetchOutcome, ForensicsResult};

/// Knobs for one forensics scan, taken from the `[scan]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub concurrency: usize,
    pub query: ActivityQuery,
    pub request_timeout: Duration,
}

impl ScanSettings {
    pub fn from_config(scan: &Scan) -> Self {
        Self {
            concurrency: scan.concurrency,
            query: ActivityQuery {
                limit: scan.activity_limit,
                order: scan.activity_order,
            },
            request_timeout: scan.request_timeout(),
        }
    }
}

/// Result of a completed scan. `forensics` has exactly one entry per input
/// wallet; wallets whose lookup failed hold [`ForensicsResult::FALLBACK`] and
/// also appear in `failures` with the reason.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub forensics: HashMap<String, ForensicsResult>,
    pub failures: HashMap<String, FetchFailure>,
}

impl ScanReport {
    fn record(&mut self, wallet: String, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Ok(f) => {
                self.forensics.insert(wallet, f);
            }
            FetchOutcome::Failed(e) => {
                metrics::counter!("scanner_forensics_fallbacks_total", "reason" => e.reason())
                    .increment(1);
                tracing::debug!(wallet = %wallet, error = %e, "forensics fell back");
                self.forensics.insert(wallet.clone(), ForensicsResult::FALLBACK);
                self.failures.insert(wallet, e);
            }
        }
    }

    /// Failure counts keyed by reason label, sorted for stable output.
    pub fn failure_summary(&self) -> Vec<(&'static str, usize)> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        for e in self.failures.values() {
            *counts.entry(e.reason()).or_insert(0) += 1;
        }
        let mut out: Vec<_> = counts.into_iter().collect();
        out.sort_unstable();
        out
    }
}

/// Look up forensics for every wallet with at most `settings.concurrency`
/// activity requests in flight.
///
/// Each wallet gets its own task; a shared semaphore gates the network call
/// and its permit is dropped on every exit path. The call returns only after
/// every task has finished. Once `cancel` fires, wallets still waiting for a
/// permit are not requested and fall back; in-flight requests run to their
/// timeout.
pub async fn scan<S>(
    source: &Arc<S>,
    wallets: &[String],
    settings: &ScanSettings,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> ScanReport
where
    S: ActivitySource + Send + Sync + 'static,
{
    let unique: BTreeSet<&str> = wallets.iter().map(String::as_str).collect();
    let permits = Arc::new(Semaphore::new(settings.concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let mut tasks = JoinSet::new();

    for wallet in &unique {
        let wallet = (*wallet).to_string();
        let source = Arc::clone(source);
        let permits = Arc::clone(&permits);
        let cancel = cancel.clone();
        let settings = *settings;

        tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => FetchOutcome::Failed(FetchFailure::Cancelled),
                permit = permits.acquire_owned() => match permit {
                    Ok(_permit) => {
                        fetch_wallet_forensics(
                            source.as_ref(),
                            &wallet,
                            &settings.query,
                            settings.request_timeout,
                            now,
                        )
                        .await
                    }
                    Err(_closed) => FetchOutcome::Failed(FetchFailure::Cancelled),
                },
            };
            (wallet, outcome)
        });
    }

    let mut report = ScanReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((wallet, outcome)) => report.record(wallet, outcome),
            Err(e) => tracing::error!(error = %e, "forensics task did not complete"),
        }
    }

    // A panicked task loses its wallet key; keep the mapping total anyway.
    for wallet in unique {
        if !report.forensics.contains_key(wallet) {
            report.record(
                wallet.to_string(),
                FetchOutcome::Failed(FetchFailure::TaskAborted),
            );
        }
    }

    metrics::counter!("scanner_wallets_scanned_total").increment(report.forensics.len() as u64);
    report
}
