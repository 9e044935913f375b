use std::sync::Arc;
use std::time::Duration;

use atelier_core::{Appraisal, DesignConfiguration, DesignWizard, ProgressStage};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{GenerationError, SubmissionError};
use crate::llm::LlmClient;
use crate::progress::ProgressTicker;
use crate::prompts::{build_analysis_request, build_image_request};

/// Runs one submission: both generative calls concurrently, with a rotating
/// progress message published while they are pending.
pub struct QuoteOrchestrator<C> {
    client: C,
    progress: Arc<watch::Sender<ProgressStage>>,
    progress_interval: Duration,
}

impl<C: LlmClient> QuoteOrchestrator<C> {
    pub fn new(client: C, progress_interval: Duration) -> Self {
        let (sender, _) = watch::channel(ProgressStage::default());
        Self { client, progress: Arc::new(sender), progress_interval }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Subscribes to the progress message shown while a submission is pending.
    pub fn progress(&self) -> watch::Receiver<ProgressStage> {
        self.progress.subscribe()
    }

    /// True while a ticker task still holds the progress channel.
    pub fn is_progress_running(&self) -> bool {
        Arc::strong_count(&self.progress) > 1
    }

    /// Produces a quote and preview for `design`. Either call failing fails the
    /// whole submission; no partial appraisal is ever returned.
    pub async fn appraise(
        &self,
        design: &DesignConfiguration,
    ) -> Result<Appraisal, SubmissionError> {
        let submission_id = uuid::Uuid::new_v4().to_string();
        info!(
            event_name = "atelier.submission.started",
            submission_id = %submission_id,
            category = %design.category,
            silhouette = %design.silhouette,
            fabric_source = %design.fabric_source,
            "submission started"
        );

        let analysis = match build_analysis_request(design) {
            Ok(request) => request,
            Err(source) => return Err(self.failed(submission_id, source)),
        };
        let image = build_image_request(design);

        let ticker = ProgressTicker::start(
            self.progress_interval,
            self.progress.clone(),
            submission_id.clone(),
        );
        let outcome =
            tokio::try_join!(self.client.analyze(&analysis), self.client.render_preview(&image));
        ticker.stop().await;

        match outcome {
            Ok((quote, preview)) => {
                info!(
                    event_name = "atelier.submission.completed",
                    submission_id = %submission_id,
                    complexity = %quote.complexity,
                    estimated_price = %quote.estimated_price,
                    preview = preview.is_some(),
                    grounded_sources = quote.sources.as_ref().map_or(0, Vec::len),
                    "submission completed"
                );
                Ok(Appraisal { submission_id, quote, preview })
            }
            Err(source) => Err(self.failed(submission_id, source)),
        }
    }

    /// Drives the wizard through one submission attempt. On failure the wizard
    /// returns to the final input step with the design intact.
    pub async fn submit(&self, wizard: &mut DesignWizard) -> Result<(), SubmissionError> {
        let design = wizard.begin_submission()?;

        match self.appraise(&design).await {
            Ok(appraisal) => {
                wizard.complete_submission(appraisal)?;
                Ok(())
            }
            Err(error) => {
                wizard.fail_submission()?;
                Err(error)
            }
        }
    }

    fn failed(&self, submission_id: String, source: GenerationError) -> SubmissionError {
        warn!(
            event_name = "atelier.submission.failed",
            submission_id = %submission_id,
            call = source.call().map(|call| call.to_string()).unwrap_or_else(|| "none".into()),
            error = %source,
            "submission failed"
        );
        SubmissionError::Failed { submission_id, source }
    }
}
