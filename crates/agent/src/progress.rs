use std::sync::Arc;
use std::time::Duration;

use atelier_core::ProgressStage;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Recurring task that rotates the progress message while a submission is
/// pending. Aborted on [`ProgressTicker::stop`] or when dropped.
#[derive(Debug)]
pub struct ProgressTicker {
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    pub fn start(
        interval: Duration,
        stages: Arc<watch::Sender<ProgressStage>>,
        submission_id: String,
    ) -> Self {
        stages.send_replace(ProgressStage::default());

        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            // The first tick completes immediately; the opening stage is already published.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                stages.send_modify(|stage| *stage = stage.next());
                let stage = *stages.borrow();
                debug!(
                    event_name = "atelier.progress.stage",
                    submission_id = %submission_id,
                    stage = stage.index(),
                    message = stage.message(),
                    "progress stage advanced"
                );
            }
        });

        Self { handle: Some(handle) }
    }

    /// Aborts the task and waits until it has been torn down.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
