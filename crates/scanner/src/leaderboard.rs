use common::types::{Side, Trade};
use std::collections::HashMap;

use crate::forensics::ForensicsResult;
use crate::scoring::score;

/// One leaderboard row: a BUY trade scored against its wallet's forensics.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry<'a> {
    pub score: f64,
    pub trade: &'a Trade,
    pub forensics: ForensicsResult,
}

impl ScoredEntry<'_> {
    pub fn wallet(&self) -> &str {
        &self.trade.wallet
    }
}

/// Score every BUY trade and rank by score, highest first.
///
/// One row per trade, so a wallet with several trades appears several
/// times. Equal scores keep the input order. A wallet missing from
/// `forensics` is scored with the fallback.
pub fn build_leaderboard<'a>(
    trades: &'a [Trade],
    forensics: &HashMap<String, ForensicsResult>,
) -> Vec<ScoredEntry<'a>> {
    let mut entries: Vec<ScoredEntry<'a>> = trades
        .iter()
        .filter(|t| t.side == Side::Buy)
        .map(|trade| {
            let f = forensics
                .get(&trade.wallet)
                .copied()
                .unwrap_or(ForensicsResult::FALLBACK);
            ScoredEntry {
                score: score(trade.spend(), &f),
                trade,
                forensics: f,
            }
        })
        .collect();

    // `sort_by` is stable.
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries
}
