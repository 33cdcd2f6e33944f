use std::time::Duration;

use common::polymarket::{ActivityQuery, PolymarketClient, TradeQuery};
use common::types::{ActivityOrder, Trade};

fn live_client() -> PolymarketClient {
    PolymarketClient::new("https://data-api.polymarket.com", Duration::from_secs(10)).unwrap()
}

#[tokio::test]
#[ignore] // requires network
async fn test_fetch_real_large_trades_parses() {
    let trades = live_client()
        .fetch_trades(&TradeQuery {
            min_spend_usd: 5000.0,
            limit: 10,
        })
        .await
        .unwrap();
    let converted: Vec<Trade> = trades.into_iter().filter_map(Trade::from_api).collect();
    assert!(!converted.is_empty());
    assert!(converted.iter().all(|t| t.spend() > 0.0));
}

#[tokio::test]
#[ignore] // requires network
async fn test_fetch_real_activity_for_recent_trader() {
    let client = live_client();
    let trades = client
        .fetch_trades(&TradeQuery {
            min_spend_usd: 5000.0,
            limit: 5,
        })
        .await
        .unwrap();
    let wallet = trades
        .into_iter()
        .find_map(|t| t.proxy_wallet)
        .expect("at least one trade with a wallet");

    let activity = client
        .fetch_activity(
            &wallet,
            &ActivityQuery {
                limit: 50,
                order: ActivityOrder::Asc,
            },
        )
        .await
        .unwrap();
    assert!(activity.len() <= 50);
}
