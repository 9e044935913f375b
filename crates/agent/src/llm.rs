use async_trait::async_trait;
use atelier_core::{InlineImage, QuoteResult};

use crate::error::GenerationError;
use crate::prompts::{AnalysisRequest, ImageRequest};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<QuoteResult, GenerationError>;

    /// `Ok(None)` when the service answered without an image part.
    async fn render_preview(
        &self,
        request: &ImageRequest,
    ) -> Result<Option<InlineImage>, GenerationError>;
}
