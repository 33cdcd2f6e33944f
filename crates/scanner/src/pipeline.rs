use anyhow::Result;
use chrono::{DateTime, Utc};
use common::config::Scan;
use common::types::Trade;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::fetcher_traits::{ActivitySource, TradeSource};
use crate::ingestion::{extract_buy_wallets, ingest_large_trades};
use crate::leaderboard::{build_leaderboard, ScoredEntry};
use crate::orchestrator::{scan, ScanReport, ScanSettings};

/// Everything one scan produced. Leaderboard rows borrow the trades.
#[derive(Debug)]
pub struct ScanRun {
    pub trades: Vec<Trade>,
    pub wallets: Vec<String>,
    pub report: ScanReport,
    pub scanned_at: DateTime<Utc>,
}

impl ScanRun {
    pub fn leaderboard(&self) -> Vec<ScoredEntry<'_>> {
        build_leaderboard(&self.trades, &self.report.forensics)
    }
}

/// Trades → wallets → forensics. Only the trades request can fail the run;
/// per-wallet problems end up in `report.failures`.
pub async fn run_scan_once<S>(
    source: &Arc<S>,
    cfg: &Scan,
    cancel: &CancellationToken,
) -> Result<ScanRun>
where
    S: TradeSource + ActivitySource + Send + Sync + 'static,
{
    let start = Instant::now();
    let trades = ingest_large_trades(source.as_ref(), cfg).await?;
    let wallets = extract_buy_wallets(&trades);
    let scanned_at = Utc::now();

    tracing::info!(
        wallets = wallets.len(),
        concurrency = cfg.concurrency,
        "scanning wallets"
    );
    let report = scan(
        source,
        &wallets,
        &ScanSettings::from_config(cfg),
        scanned_at,
        cancel,
    )
    .await;

    let run = ScanRun {
        trades,
        wallets,
        report,
        scanned_at,
    };

    let entries = run.leaderboard().len();
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("scanner_scan_duration_ms").record(ms);
    metrics::gauge!("scanner_leaderboard_entries").set(entries as f64);
    tracing::info!(
        entries,
        wallets = run.wallets.len(),
        failed = run.report.failures.len(),
        elapsed_ms = ms as u64,
        "scan complete"
    );
    Ok(run)
}
