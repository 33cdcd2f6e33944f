use metrics_exporter_prometheus::PrometheusBuilder;

// Integration test: goes through the public `common::observability` surface.

#[test]
fn error_events_are_counted() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let (dispatch, _otel_guard) = common::observability::build_dispatch("scanner-test", "info");

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(wallet = "0xabc", "not counted");
            tracing::error!(wallet = "0xabc", "activity lookup blew up");
        });
    });

    let rendered = handle.render();
    assert!(
        rendered.contains(common::observability::LOG_ERRORS_COUNTER),
        "expected {} in rendered metrics, got:\n{rendered}",
        common::observability::LOG_ERRORS_COUNTER
    );
}
