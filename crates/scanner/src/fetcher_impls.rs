use common::polymarket::{ActivityQuery, ApiError, PolymarketClient, TradeQuery};
use common::types::{ActivityRecord, ApiPosition, Trade};
use std::time::Instant;

use crate::fetcher_traits::{ActivitySource, PositionsSource, TradeSource};

/// Latency histogram plus request/error counters for one Data API call.
fn record_api_call<T>(endpoint: &'static str, start: Instant, res: &Result<T, ApiError>) {
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("scanner_api_latency_ms", "endpoint" => endpoint).record(ms);
    match res {
        Ok(_) => {
            metrics::counter!(
                "scanner_api_requests_total",
                "endpoint" => endpoint,
                "status" => "ok"
            )
            .increment(1);
        }
        Err(e) => {
            metrics::counter!(
                "scanner_api_requests_total",
                "endpoint" => endpoint,
                "status" => "error"
            )
            .increment(1);
            metrics::counter!(
                "scanner_api_errors_total",
                "endpoint" => endpoint,
                "kind" => e.kind().as_str()
            )
            .increment(1);
        }
    }
}

impl TradeSource for PolymarketClient {
    async fn fetch_large_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>, ApiError> {
        let start = Instant::now();
        let res = self.fetch_trades(query).await;
        record_api_call("trades", start, &res);

        let raw = res?;
        let total = raw.len();
        let trades: Vec<Trade> = raw.into_iter().filter_map(Trade::from_api).collect();
        if trades.len() < total {
            tracing::debug!(
                dropped = total - trades.len(),
                "dropped trades without a wallet"
            );
        }
        Ok(trades)
    }
}

impl ActivitySource for PolymarketClient {
    async fn fetch_activity(
        &self,
        user: &str,
        query: &ActivityQuery,
    ) -> Result<Vec<ActivityRecord>, ApiError> {
        let start = Instant::now();
        let res = PolymarketClient::fetch_activity(self, user, query).await;
        record_api_call("activity", start, &res);
        res
    }
}

impl PositionsSource for PolymarketClient {
    async fn fetch_positions(&self, user: &str) -> Result<Vec<ApiPosition>, ApiError> {
        let start = Instant::now();
        let res = PolymarketClient::fetch_positions(self, user).await;
        record_api_call("positions", start, &res);
        res
    }
}
