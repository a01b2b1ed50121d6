use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::context::JournalSession;

/// Tick `session` every `period` until the returned handle is aborted.
///
/// Each tick runs on the blocking pool and is awaited before the next one is
/// scheduled, so ticks never overlap. A slow tick delays the schedule rather
/// than causing a burst of catch-up ticks.
pub fn spawn_poller(session: Arc<JournalSession>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            directory = %session.directory().display(),
            period_ms = period.as_millis() as u64,
            "[SESSION] poller started"
        );

        loop {
            ticker.tick().await;
            let session = Arc::clone(&session);
            match tokio::task::spawn_blocking(move || session.tick()).await {
                Ok(report) => {
                    if let Some(error) = report.io_error {
                        tracing::debug!(%error, "[SESSION] tick hit an I/O error, retrying next tick");
                    }
                }
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    tracing::error!(error = %e, "[SESSION] tick task panicked");
                }
            }
        }
    })
}
