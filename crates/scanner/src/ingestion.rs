use anyhow::{Context, Result};
use common::config::Scan;
use common::polymarket::TradeQuery;
use common::types::{Side, Trade};
use std::collections::BTreeSet;

use crate::fetcher_traits::TradeSource;

/// Pull recent large taker trades and apply the optional title keyword.
/// An empty result is not an error.
pub async fn ingest_large_trades<T: TradeSource + Sync>(
    source: &T,
    scan: &Scan,
) -> Result<Vec<Trade>> {
    let query = TradeQuery {
        min_spend_usd: scan.min_spend_usd,
        limit: scan.trade_limit,
    };
    let trades = source
        .fetch_large_trades(&query)
        .await
        .context("failed to fetch recent large trades")?;
    let fetched = trades.len();

    let trades = match scan.keyword() {
        Some(keyword) => filter_by_keyword(trades, keyword),
        None => trades,
    };

    tracing::info!(
        fetched,
        kept = trades.len(),
        min_spend_usd = scan.min_spend_usd,
        "ingested large trades"
    );
    Ok(trades)
}

/// Case-insensitive substring match on the market title.
pub fn filter_by_keyword(trades: Vec<Trade>, keyword: &str) -> Vec<Trade> {
    let needle = keyword.to_lowercase();
    trades
        .into_iter()
        .filter(|t| t.market_title.to_lowercase().contains(&needle))
        .collect()
}

/// Distinct wallets behind BUY trades, sorted.
pub fn extract_buy_wallets(trades: &[Trade]) -> Vec<String> {
    trades
        .iter()
        .filter(|t| t.side == Side::Buy)
        .map(|t| t.wallet.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::polymarket::ApiError;
    use std::sync::Mutex;

    fn trade(wallet: &str, title: &str, side: Side) -> Trade {
        Trade {
            timestamp: 1,
            wallet: wallet.to_string(),
            market_title: title.to_string(),
            outcome: "Yes".to_string(),
            price: 0.5,
            size: 20_000.0,
            side,
        }
    }

    fn scan_config(keyword: Option<&str>) -> Scan {
        Scan {
            min_spend_usd: 10_000.0,
            trade_limit: 25,
            concurrency: 5,
            activity_limit: 100,
            activity_order: common::types::ActivityOrder::Asc,
            request_timeout_secs: 10,
            keyword: keyword.map(str::to_string),
            refresh_interval_secs: 300,
        }
    }

    struct FakeTrades {
        trades: Vec<Trade>,
        seen: Mutex<Option<TradeQuery>>,
    }

    impl TradeSource for FakeTrades {
        async fn fetch_large_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, ApiError> {
            *self.seen.lock().unwrap() = Some(query.clone());
            Ok(self.trades.clone())
        }
    }

    struct DownTrades;

    impl TradeSource for DownTrades {
        async fn fetch_large_trades(&self, _query: &TradeQuery) -> Result<Vec<Trade>, ApiError> {
            Err(ApiError::Status { status: 502 })
        }
    }

    #[test]
    fn test_extract_buy_wallets_sorted_and_distinct() {
        let trades = vec![
            trade("0xc", "A", Side::Buy),
            trade("0xa", "B", Side::Buy),
            trade("0xz", "C", Side::Sell),
            trade("0xc", "D", Side::Buy),
            trade("0xq", "E", Side::Other),
        ];
        assert_eq!(extract_buy_wallets(&trades), vec!["0xa", "0xc"]);
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive() {
        let trades = vec![
            trade("0xa", "Will the Fed cut rates?", Side::Buy),
            trade("0xb", "Presidential election winner", Side::Buy),
        ];
        let kept = filter_by_keyword(trades, "ELECTION");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].wallet, "0xb");
    }

    #[tokio::test]
    async fn test_ingest_passes_thresholds_and_filters() {
        let source = FakeTrades {
            trades: vec![
                trade("0xa", "Fed decision", Side::Buy),
                trade("0xb", "Election", Side::Buy),
            ],
            seen: Mutex::new(None),
        };
        let trades = ingest_large_trades(&source, &scan_config(Some("fed")))
            .await
            .unwrap();
        assert_eq!(trades.len(), 1);

        let seen = source.seen.lock().unwrap().clone().unwrap();
        assert!((seen.min_spend_usd - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(seen.limit, 25);
    }

    #[tokio::test]
    async fn test_ingest_empty_is_ok() {
        let source = FakeTrades {
            trades: vec![],
            seen: Mutex::new(None),
        };
        let trades = ingest_large_trades(&source, &scan_config(None)).await.unwrap();
        assert!(trades.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_surfaces_upstream_failure() {
        let err = ingest_large_trades(&DownTrades, &scan_config(None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("recent large trades"));
    }
}
