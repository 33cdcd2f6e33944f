use anyhow::{Context, Result};
use chrono::Utc;
use common::config::Scan;
use common::types::ApiPosition;
use std::fmt::Write as _;

use crate::fetcher_traits::{ActivitySource, PositionsSource};
use crate::forensics::{fetch_wallet_forensics, FetchOutcome};
use crate::orchestrator::ScanSettings;
use crate::pipeline::ScanRun;

const USAGE: &str = "\
usage: scanner [scan|watch] [--min-spend N] [--limit N] [--concurrency N] [--keyword S]
       scanner wallet <address>
       scanner positions <address>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    Watch,
    Wallet { address: String },
    Positions { address: String },
}

/// Per-invocation overrides of the `[scan]` config section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOverrides {
    pub min_spend_usd: Option<f64>,
    pub trade_limit: Option<u32>,
    pub concurrency: Option<usize>,
    pub keyword: Option<String>,
}

impl ScanOverrides {
    /// Copy of `base` with the overrides applied, re-validated.
    pub fn apply(&self, base: &Scan) -> Result<Scan> {
        let mut scan = base.clone();
        if let Some(v) = self.min_spend_usd {
            scan.min_spend_usd = v;
        }
        if let Some(v) = self.trade_limit {
            scan.trade_limit = v;
        }
        if let Some(v) = self.concurrency {
            scan.concurrency = v;
        }
        if let Some(v) = &self.keyword {
            scan.keyword = Some(v.clone());
        }
        scan.validate()?;
        Ok(scan)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    pub overrides: ScanOverrides,
}

pub fn parse_args<I>(mut args: I) -> std::result::Result<Invocation, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let _ = args.next();

    let mut args = args.peekable();
    let command = match args.peek().map(String::as_str) {
        None => Command::Scan,
        Some(flag) if flag.starts_with("--") => Command::Scan,
        Some(_) => {
            let cmd = args.next().unwrap_or_default();
            match cmd.as_str() {
                "scan" => Command::Scan,
                "watch" => Command::Watch,
                "wallet" => Command::Wallet {
                    address: args
                        .next()
                        .ok_or_else(|| "usage: scanner wallet <address>".to_string())?,
                },
                "positions" => Command::Positions {
                    address: args
                        .next()
                        .ok_or_else(|| "usage: scanner positions <address>".to_string())?,
                },
                "help" | "-h" => return Err(USAGE.to_string()),
                other => return Err(format!("unknown command: {other}\n{USAGE}")),
            }
        }
    };

    let mut overrides = ScanOverrides::default();
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--min-spend" => overrides.min_spend_usd = Some(parse_value(&flag, &value)?),
            "--limit" => overrides.trade_limit = Some(parse_value(&flag, &value)?),
            "--concurrency" => overrides.concurrency = Some(parse_value(&flag, &value)?),
            "--keyword" => overrides.keyword = Some(value),
            other => return Err(format!("unknown flag: {other}\n{USAGE}")),
        }
    }

    Ok(Invocation { command, overrides })
}

fn parse_value<T>(flag: &str, value: &str) -> std::result::Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("invalid value for {flag}: {value} ({e})"))
}

fn short_wallet(w: &str) -> String {
    if w.len() > 14 && w.is_ascii() {
        format!("{}…{}", &w[..8], &w[w.len() - 4..])
    } else {
        w.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

pub fn render_leaderboard(run: &ScanRun) -> String {
    let board = run.leaderboard();
    let mut out = String::new();
    if board.is_empty() {
        out.push_str("No trades found. Try lowering the threshold.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "Insider leaderboard ({} trades, {} wallets, {})",
        board.len(),
        run.wallets.len(),
        run.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "{:>12}  {:<14}  {:>12}  {:>8}  {:>7}  {:<10}  MARKET",
        "SCORE", "WALLET", "SPEND", "AGE(D)", "MARKETS", "PREDICTION"
    );
    for e in &board {
        let _ = writeln!(
            out,
            "{:>12.2}  {:<14}  {:>12.2}  {:>8.2}  {:>7}  {:<10}  {}",
            e.score,
            short_wallet(e.wallet()),
            e.trade.spend(),
            e.forensics.age_days,
            e.forensics.unique_markets,
            truncate(&e.trade.outcome, 10),
            truncate(&e.trade.market_title, 60),
        );
    }

    write_failure_summary(&mut out, run);
    out
}

/// Output for a scan cut short by Ctrl-C. Wallets that were never looked up
/// hold the fallback and would top the ranking, so no rows are printed.
pub fn render_interrupted(run: &ScanRun) -> String {
    let mut out = String::new();
    let completed = run.wallets.len().saturating_sub(run.report.failures.len());
    let _ = writeln!(
        out,
        "Scan interrupted: {completed} of {} wallet lookups completed. Leaderboard not shown.",
        run.wallets.len()
    );
    write_failure_summary(&mut out, run);
    out
}

fn write_failure_summary(out: &mut String, run: &ScanRun) {
    let summary = run.report.failure_summary();
    if summary.is_empty() {
        return;
    }
    let parts: Vec<String> = summary.iter().map(|(r, n)| format!("{r}={n}")).collect();
    let _ = writeln!(
        out,
        "{} wallet lookups fell back to age 0 / 1 market ({})",
        run.report.failures.len(),
        parts.join(", ")
    );
}

pub async fn show_wallet<S: ActivitySource>(source: &S, scan: &Scan, address: &str) -> Result<()> {
    let settings = ScanSettings::from_config(scan);
    let outcome = fetch_wallet_forensics(
        source,
        address,
        &settings.query,
        settings.request_timeout,
        Utc::now(),
    )
    .await;

    println!("Wallet: {address}");
    match outcome {
        FetchOutcome::Ok(f) => {
            println!("  age_days={:.2}  unique_markets={}", f.age_days, f.unique_markets);
            println!(
                "  (from the first {} activity records, sorted {})",
                settings.query.limit,
                settings.query.order.as_str()
            );
        }
        FetchOutcome::Failed(e) => {
            println!("  lookup failed ({}): {e}", e.reason());
            println!("  a scan would score this wallet as age 0 / 1 market");
        }
    }
    Ok(())
}

pub fn render_positions(address: &str, positions: &[ApiPosition]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Positions: {address}");
    if positions.is_empty() {
        out.push_str("  (none)\n");
        return out;
    }
    for p in positions {
        let _ = writeln!(
            out,
            "  {:>12.2} @ {:<6.3}  value={:>12.2}  pnl={:>10.2}  {:<10}  {}",
            p.size.unwrap_or(0.0),
            p.avg_price.unwrap_or(0.0),
            p.current_value.unwrap_or(0.0),
            p.cash_pnl.unwrap_or(0.0),
            truncate(p.outcome.as_deref().unwrap_or("?"), 10),
            truncate(p.title.as_deref().or(p.condition_id.as_deref()).unwrap_or("?"), 60),
        );
    }
    out
}

pub async fn show_positions<P: PositionsSource>(source: &P, address: &str) -> Result<()> {
    let positions = source
        .fetch_positions(address)
        .await
        .with_context(|| format!("failed to fetch positions for {address}"))?;
    print!("{}", render_positions(address, &positions));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forensics::{FetchFailure, ForensicsResult};
    use crate::orchestrator::ScanReport;
    use common::polymarket::ApiError;
    use common::types::{ActivityOrder, Side, Trade};

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        std::iter::once("scanner")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn base_scan() -> Scan {
        Scan {
            min_spend_usd: 50_000.0,
            trade_limit: 100,
            concurrency: 20,
            activity_limit: 100,
            activity_order: ActivityOrder::Asc,
            request_timeout_secs: 10,
            keyword: None,
            refresh_interval_secs: 300,
        }
    }

    #[test]
    fn test_parse_args_defaults_to_scan() {
        let inv = parse_args(args(&[])).unwrap();
        assert_eq!(inv.command, Command::Scan);
        assert_eq!(inv.overrides, ScanOverrides::default());
    }

    #[test]
    fn test_parse_flags_without_command() {
        let inv = parse_args(args(&["--min-spend", "5000", "--concurrency", "8"])).unwrap();
        assert_eq!(inv.command, Command::Scan);
        assert_eq!(inv.overrides.min_spend_usd, Some(5000.0));
        assert_eq!(inv.overrides.concurrency, Some(8));
    }

    #[test]
    fn test_parse_watch_with_keyword() {
        let inv = parse_args(args(&["watch", "--keyword", "election", "--limit", "300"])).unwrap();
        assert_eq!(inv.command, Command::Watch);
        assert_eq!(inv.overrides.keyword.as_deref(), Some("election"));
        assert_eq!(inv.overrides.trade_limit, Some(300));
    }

    #[test]
    fn test_parse_wallet_command() {
        let inv = parse_args(args(&["wallet", "0xabc"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Wallet {
                address: "0xabc".to_string()
            }
        );
        assert!(parse_args(args(&["positions"])).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(args(&["--concurrency", "many"])).is_err());
        assert!(parse_args(args(&["--limit"])).is_err());
        assert!(parse_args(args(&["--verbose", "1"])).is_err());
    }

    #[test]
    fn test_overrides_apply_and_validate() {
        let overrides = ScanOverrides {
            min_spend_usd: Some(5000.0),
            concurrency: Some(7),
            ..ScanOverrides::default()
        };
        let scan = overrides.apply(&base_scan()).unwrap();
        assert!((scan.min_spend_usd - 5000.0).abs() < f64::EPSILON);
        assert_eq!(scan.concurrency, 7);
        assert_eq!(scan.trade_limit, 100);

        let zero = ScanOverrides {
            concurrency: Some(0),
            ..ScanOverrides::default()
        };
        assert!(zero.apply(&base_scan()).is_err());

        let huge = parse_args(args(&["--concurrency", "3000000000000000000"])).unwrap();
        assert!(huge.overrides.apply(&base_scan()).is_err());
    }

    fn run_with(trades: Vec<Trade>, report: ScanReport) -> ScanRun {
        ScanRun {
            wallets: crate::ingestion::extract_buy_wallets(&trades),
            trades,
            report,
            scanned_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_empty_leaderboard() {
        let out = render_leaderboard(&run_with(vec![], ScanReport::default()));
        assert!(out.contains("No trades found"));
    }

    #[test]
    fn test_render_leaderboard_rows_and_failures() {
        let trades = vec![Trade {
            timestamp: 1,
            wallet: "0x56687bf447db6ffa42ffe2204a05edaa20f55839".to_string(),
            market_title: "Will the Fed cut rates in March?".to_string(),
            outcome: "No".to_string(),
            price: 0.5,
            size: 10_000.0,
            side: Side::Buy,
        }];
        let mut report = ScanReport::default();
        report.forensics.insert(trades[0].wallet.clone(), ForensicsResult::FALLBACK);
        report.failures.insert(
            trades[0].wallet.clone(),
            FetchFailure::Api(ApiError::Status { status: 429 }),
        );

        let out = render_leaderboard(&run_with(trades, report));
        assert!(out.contains("10000.00"));
        assert!(out.contains("0x56687b…5839"));
        assert!(out.contains("Will the Fed cut rates in March?"));
        assert!(out.contains("rate_limited=1"));
    }

    #[test]
    fn test_render_interrupted_hides_fallback_rows() {
        let trades = vec![
            Trade {
                timestamp: 1,
                wallet: "0xdone".to_string(),
                market_title: "Finished lookup".to_string(),
                outcome: "Yes".to_string(),
                price: 0.5,
                size: 10_000.0,
                side: Side::Buy,
            },
            Trade {
                timestamp: 1,
                wallet: "0xpending".to_string(),
                market_title: "Never looked up".to_string(),
                outcome: "Yes".to_string(),
                price: 0.5,
                size: 10_000.0,
                side: Side::Buy,
            },
        ];
        let mut report = ScanReport::default();
        report.forensics.insert(
            "0xdone".to_string(),
            ForensicsResult {
                age_days: 300.0,
                unique_markets: 40,
            },
        );
        report.forensics.insert("0xpending".to_string(), ForensicsResult::FALLBACK);
        report
            .failures
            .insert("0xpending".to_string(), FetchFailure::Cancelled);

        let out = render_interrupted(&run_with(trades, report));
        assert!(out.contains("1 of 2 wallet lookups completed"));
        assert!(out.contains("cancelled=1"));
        assert!(!out.contains("0xpending"));
        assert!(!out.contains("Never looked up"));
    }

    #[test]
    fn test_render_positions() {
        let out = render_positions("0xabc", &[]);
        assert!(out.contains("(none)"));
    }
}
