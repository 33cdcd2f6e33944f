use chrono::{DateTime, Utc};
use common::polymarket::{ActivityQuery, ApiError};
use common::types::ActivityRecord;
use std::collections::HashSet;
use std::time::Duration;

use crate::fetcher_traits::ActivitySource;
use crate::scoring::round2;

const SECS_PER_DAY: f64 = 86_400.0;

/// Per-wallet suspicion inputs derived from one page of activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForensicsResult {
    /// Days since the oldest activity in the fetched window, 2 decimals, never negative.
    pub age_days: f64,
    /// Distinct markets (condition ids) in the fetched window.
    pub unique_markets: u32,
}

impl ForensicsResult {
    /// Used for any wallet whose lookup failed: a brand-new, single-market
    /// account. Such wallets rank near the top of the leaderboard.
    pub const FALLBACK: Self = Self {
        age_days: 0.0,
        unique_markets: 1,
    };
}

/// Why a lookup degraded to [`ForensicsResult::FALLBACK`].
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("activity request failed: {0}")]
    Api(#[from] ApiError),
    #[error("activity request exceeded {0:?}")]
    Timeout(Duration),
    #[error("wallet has no activity")]
    Empty,
    #[error("no activity record carries a timestamp")]
    MissingTimestamp,
    #[error("scan cancelled before the request was issued")]
    Cancelled,
    #[error("forensics task aborted")]
    TaskAborted,
}

impl FetchFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Api(e) => e.kind().as_str(),
            Self::Timeout(_) => "timeout",
            Self::Empty => "empty",
            Self::MissingTimestamp => "missing_timestamp",
            Self::Cancelled => "cancelled",
            Self::TaskAborted => "task_aborted",
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Ok(ForensicsResult),
    Failed(FetchFailure),
}

/// Reduce one page of activity to forensics.
///
/// The oldest timestamp in the page is the wallet's earliest known activity.
/// For a well-ordered page that is the first record (ASC) or the last (DESC);
/// taking the minimum also holds when the upstream order is off. Records
/// without a timestamp still count towards markets.
pub fn derive_forensics(
    records: &[ActivityRecord],
    now: DateTime<Utc>,
) -> Result<ForensicsResult, FetchFailure> {
    if records.is_empty() {
        return Err(FetchFailure::Empty);
    }

    let earliest = records
        .iter()
        .filter_map(|r| r.timestamp)
        .min()
        .ok_or(FetchFailure::MissingTimestamp)?;

    let age_secs = now.timestamp().saturating_sub(earliest).max(0);
    let age_days = round2(age_secs as f64 / SECS_PER_DAY);

    let markets: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.condition_id.as_deref())
        .filter(|c| !c.is_empty())
        .collect();

    Ok(ForensicsResult {
        age_days,
        unique_markets: u32::try_from(markets.len()).unwrap_or(u32::MAX),
    })
}

/// One activity request for `wallet`, bounded by `timeout`. Never errors:
/// every failure comes back as [`FetchOutcome::Failed`].
pub async fn fetch_wallet_forensics<S: ActivitySource>(
    source: &S,
    wallet: &str,
    query: &ActivityQuery,
    timeout: Duration,
    now: DateTime<Utc>,
) -> FetchOutcome {
    metrics::gauge!("scanner_forensics_inflight").increment(1.0);
    let fetched = tokio::time::timeout(timeout, source.fetch_activity(wallet, query)).await;
    metrics::gauge!("scanner_forensics_inflight").decrement(1.0);

    let records = match fetched {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return FetchOutcome::Failed(FetchFailure::Api(e)),
        Err(_elapsed) => return FetchOutcome::Failed(FetchFailure::Timeout(timeout)),
    };

    match derive_forensics(&records, now) {
        Ok(f) => FetchOutcome::Ok(f),
        Err(e) => FetchOutcome::Failed(e),
    }
}
