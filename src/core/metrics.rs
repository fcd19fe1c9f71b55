use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder when enabled. Calling this twice in one
/// process is a no-op, which keeps in-process test harnesses happy.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || RECORDER.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    let _ = RECORDER.set(handle);
    Ok(())
}

fn describe() {
    metrics::describe_counter!("http_requests_total", "HTTP requests served");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request latency in seconds"
    );
    metrics::describe_counter!(
        "automark_answers_scored_total",
        "Answers scored by the automatic marking pass"
    );
    metrics::describe_counter!(
        "automark_answers_flagged_total",
        "Answers the automatic marking pass deferred to a human"
    );
}

pub(crate) fn render() -> Option<String> {
    RECORDER.get().map(PrometheusHandle::render)
}
