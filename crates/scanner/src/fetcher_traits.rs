use common::polymarket::{ActivityQuery, ApiError, TradeQuery};
use common::types::{ActivityRecord, ApiPosition, Trade};

/// Source of large recent taker trades.
pub trait TradeSource {
    fn fetch_large_trades(
        &self,
        query: &TradeQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Trade>, ApiError>> + Send;
}

/// Source of one wallet's activity history. One call is one outbound request.
pub trait ActivitySource {
    fn fetch_activity(
        &self,
        user: &str,
        query: &ActivityQuery,
    ) -> impl std::future::Future<Output = Result<Vec<ActivityRecord>, ApiError>> + Send;
}

pub trait PositionsSource {
    fn fetch_positions(
        &self,
        user: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ApiPosition>, ApiError>> + Send;
}
