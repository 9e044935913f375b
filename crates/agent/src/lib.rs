//! Generative boundary for the atelier configurator.
//!
//! This crate turns a finished [`atelier_core::DesignConfiguration`] into an
//! [`atelier_core::Appraisal`]:
//! - Builds the analysis and illustration prompts (`prompts`)
//! - Talks to the Gemini `generateContent` API (`gemini`)
//! - Runs both calls concurrently with all-or-nothing semantics (`orchestrator`)
//! - Rotates a cosmetic progress message while the calls are pending (`progress`)
//!
//! # Failure model
//!
//! Every failure is logged with its specific cause ([`error::GenerationError`])
//! and then surfaces to the caller as one generic submission failure. The
//! wizard returns to its last input step; nothing is retried automatically.

pub mod error;
pub mod gemini;
pub mod llm;
pub mod orchestrator;
pub mod progress;
pub mod prompts;

pub use error::{GenerationError, ServiceCall, SubmissionError};
pub use gemini::GeminiClient;
pub use llm::LlmClient;
pub use orchestrator::QuoteOrchestrator;
pub use progress::ProgressTicker;
pub use prompts::{AnalysisRequest, ImageRequest};
