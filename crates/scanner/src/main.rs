use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

mod cli;
mod fetcher_impls;
mod fetcher_traits;
mod forensics;
mod ingestion;
mod leaderboard;
mod metrics;
mod orchestrator;
mod pipeline;
mod scheduler;
mod scoring;

#[tokio::main]
async fn main() -> Result<()> {
    let config = common::config::Config::load()?;

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("scanner", &config.general.log_level);
    tracing::dispatcher::set_global_default(dispatch).map_err(anyhow::Error::msg)?;

    let invocation = cli::parse_args(std::env::args()).map_err(anyhow::Error::msg)?;
    let scan_cfg = invocation.overrides.apply(&config.scan)?;

    let api = Arc::new(common::polymarket::PolymarketClient::new(
        &config.polymarket.data_api_url,
        scan_cfg.request_timeout(),
    )?);

    match invocation.command {
        cli::Command::Wallet { address } => {
            cli::show_wallet(api.as_ref(), &scan_cfg, &address).await
        }
        cli::Command::Positions { address } => cli::show_positions(api.as_ref(), &address).await,
        cli::Command::Scan => {
            let cancel = CancellationToken::new();
            spawn_ctrl_c(cancel.clone());
            let run = pipeline::run_scan_once(&api, &scan_cfg, &cancel)
                .instrument(tracing::info_span!("job_run", job = "scan"))
                .await?;
            print!("{}", render(&run, &cancel));
            Ok(())
        }
        cli::Command::Watch => watch(api, scan_cfg, config.observability.prometheus_port).await,
    }
}

/// Rescan on the refresh interval until Ctrl-C. A failed run is logged and
/// the loop waits for the next tick.
async fn watch(
    api: Arc<common::polymarket::PolymarketClient>,
    scan_cfg: common::config::Scan,
    prometheus_port: Option<u16>,
) -> Result<()> {
    if let Some(port) = prometheus_port {
        metrics::install_prometheus(port)?;
        metrics::describe();
    }

    tracing::info!(
        refresh_interval_secs = scan_cfg.refresh_interval_secs,
        min_spend_usd = scan_cfg.min_spend_usd,
        "insider scanner watching"
    );

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let (scan_tx, mut scan_rx) = tokio::sync::mpsc::channel::<()>(1);
    let handles = scheduler::start(
        vec![scheduler::JobSpec {
            name: "scan".to_string(),
            interval: std::time::Duration::from_secs(scan_cfg.refresh_interval_secs),
            tick: scan_tx,
            run_immediately: true,
        }],
        &cancel,
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            tick = scan_rx.recv() => {
                if tick.is_none() {
                    break;
                }
                let span = tracing::info_span!("job_run", job = "scan");
                match pipeline::run_scan_once(&api, &scan_cfg, &cancel).instrument(span).await {
                    Ok(run) => print!("{}", render(&run, &cancel)),
                    Err(e) => tracing::error!(error = %e, "scan failed"),
                }
            }
        }
    }

    for handle in handles {
        let _ = handle.await;
    }
    tracing::info!("insider scanner stopped");
    Ok(())
}

fn render(run: &pipeline::ScanRun, cancel: &CancellationToken) -> String {
    if cancel.is_cancelled() {
        cli::render_interrupted(run)
    } else {
        cli::render_leaderboard(run)
    }
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}
