use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level; without it, sqlx and hyper are quieted to `warn` so
/// per-query logging does not drown the marking spans.
pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let telemetry = settings.telemetry();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},sqlx=warn,hyper=warn", telemetry.log_level))
    });

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let installed =
        if telemetry.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
