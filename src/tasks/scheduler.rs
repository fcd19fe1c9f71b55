use anyhow::Result;
use time::Duration as TimeDuration;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::marking;

/// Runs the marking workers until a shutdown signal arrives.
///
/// Each worker polls for tests stuck in `auto_marking`: either the HTTP
/// process that accepted the sheet crashed mid-pass, or its scoring task
/// was lost. Reclaiming is a compare-and-set on the row, so workers and
/// the in-process scoring task never double-score an answer beyond the
/// idempotent unmarked-only pass.
pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let concurrency = state.settings().marking().worker_concurrency as usize;

    let mut handles = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        handles.push(tokio::spawn(marking_worker(state.clone(), shutdown_rx.clone())));
    }

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn marking_worker(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let poll = Duration::from_secs(state.settings().marking().worker_poll_seconds);
    let stale_after = state.settings().marking().stale_after_seconds;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match claim_stale_test(&state, stale_after).await {
            Ok(Some(test_id)) => {
                tracing::info!(test_id, "Reclaimed stalled auto marking pass");
                if let Err(err) = marking::run_auto_marking(&state, &test_id).await {
                    tracing::error!(test_id, error = %err, "Resumed auto marking failed");
                }
                continue;
            }
            Ok(None) => {}
            Err(err) => tracing::error!(error = %err, "Failed to claim stalled test"),
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sleep(poll) => {}
        }
    }
}

async fn claim_stale_test(state: &AppState, stale_after_seconds: u64) -> Result<Option<String>> {
    let now = primitive_now_utc();
    let stale_before = now - TimeDuration::seconds(stale_after_seconds as i64);

    let claimed =
        repositories::tests::claim_stale_auto_marking(state.db(), stale_before, now).await?;
    Ok(claimed.map(|test| test.id))
}
