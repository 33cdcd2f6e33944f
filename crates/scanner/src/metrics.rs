use anyhow::Result;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "scanner_api_requests_total",
        "Data API requests by endpoint and status."
    );
    describe_counter!(
        "scanner_api_errors_total",
        "Data API request failures by endpoint and kind."
    );
    describe_histogram!(
        "scanner_api_latency_ms",
        "Data API request latency in milliseconds."
    );
    describe_gauge!(
        "scanner_forensics_inflight",
        "Activity requests currently in flight."
    );
    describe_counter!(
        "scanner_forensics_fallbacks_total",
        "Wallets whose forensics fell back, by reason."
    );
    describe_counter!(
        "scanner_wallets_scanned_total",
        "Wallets given a forensics result."
    );
    describe_gauge!(
        "scanner_leaderboard_entries",
        "Rows on the most recent leaderboard."
    );
    describe_histogram!(
        "scanner_scan_duration_ms",
        "Wall time of one full scan in milliseconds."
    );
}

/// Install the global recorder and serve `/metrics` on `port`.
/// Must be called from inside the tokio runtime.
pub fn install_prometheus(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_handle_renders_metric_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe();
            metrics::counter!("scanner_forensics_fallbacks_total", "reason" => "timeout")
                .increment(1);
            metrics::gauge!("scanner_leaderboard_entries").set(3.0);
        });

        let rendered = handle.render();
        assert!(rendered.contains("scanner_forensics_fallbacks_total"));
        assert!(rendered.contains("reason=\"timeout\""));
        assert!(rendered.contains("scanner_leaderboard_entries"));
    }
}
