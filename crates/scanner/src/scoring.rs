use crate::forensics::ForensicsResult;

/// Added to the age so same-day wallets do not divide by zero.
pub const AGE_FLOOR_DAYS: f64 = 0.5;

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Suspicion score for one trade:
/// `(spend / (age_days + 0.5)) * (1 / max(unique_markets, 1))`, 2 decimals.
///
/// Young wallets and wallets concentrated in few markets score higher. The
/// value is unbounded and only meaningful as a ranking key within one scan.
pub fn score(spend: f64, forensics: &ForensicsResult) -> f64 {
    let markets = forensics.unique_markets.max(1);
    let age = forensics.age_days.max(0.0) + AGE_FLOOR_DAYS;
    round2((spend / age) * (1.0 / f64::from(markets)))
}
