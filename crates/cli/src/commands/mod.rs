pub mod catalog;
pub mod config;
pub mod doctor;
pub mod quote;
pub mod wizard;

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use atelier_agent::{GeminiClient, LlmClient, QuoteOrchestrator, SubmissionError};
use atelier_core::config::{AppConfig, LoadOptions};
use atelier_core::{Appraisal, DesignWizard, InterfaceError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::logging::init_logging;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_SUBMISSION: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failed submissions carry the submission id so a user report can be
    /// matched to the `atelier.submission.failed` log event.
    pub fn submission_failure(command: &str, error: SubmissionError) -> Self {
        let interface = error.into_interface();
        let class = match interface {
            InterfaceError::ServiceUnavailable { .. } => "submission_failed",
            InterfaceError::BadRequest { .. } => "submission_rejected",
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(class.to_string()),
            message: interface.user_message().to_string(),
            correlation_id: Some(interface.correlation_id().to_string()),
        };
        Self { exit_code: EXIT_SUBMISSION, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Shared start-up for commands that talk to the generative service: load and
/// validate config, install logging, build the client and a runtime.
pub(crate) struct Session {
    pub orchestrator: QuoteOrchestrator<GeminiClient>,
    pub runtime: tokio::runtime::Runtime,
}

pub(crate) fn start_session(command: &str) -> Result<Session, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    init_logging(&config);

    let client = GeminiClient::from_config(&config).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })?;
    let orchestrator =
        QuoteOrchestrator::new(client, Duration::from_millis(config.progress.interval_ms));

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        })?;

    Ok(Session { orchestrator, runtime })
}

/// Submits the wizard's design, echoing each progress message to stderr while
/// the calls are pending.
pub(crate) async fn submit_with_progress<C: LlmClient>(
    orchestrator: &QuoteOrchestrator<C>,
    wizard: &mut DesignWizard,
    show_progress: bool,
) -> Result<(), SubmissionError> {
    let printer = show_progress.then(|| {
        let mut progress = orchestrator.progress();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let stage = *progress.borrow_and_update();
                eprintln!("  {}", stage.message());
            }
        })
    });

    let result = orchestrator.submit(wizard).await;

    if let Some(printer) = printer {
        printer.abort();
    }
    result
}

/// Reads a local swatch image into the `data:` URL form an upload source holds.
pub fn encode_swatch(path: &Path) -> anyhow::Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("could not read swatch `{}`", path.display()))?;
    if bytes.is_empty() {
        bail!("swatch `{}` is empty", path.display());
    }

    let mime_type = match path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    };

    Ok(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
}

/// Human-readable rendering of a finished appraisal.
pub fn render_appraisal(appraisal: &Appraisal) -> String {
    let quote = &appraisal.quote;
    let mut lines = vec![
        "Atelier appraisal".to_string(),
        format!("- estimated price: {}", quote.estimated_price),
        format!("- labor: {}", quote.labor_hours),
        format!("- complexity: {}", quote.complexity),
        "- construction breakdown:".to_string(),
    ];
    lines.extend(quote.breakdown.iter().map(|step| format!("    * {step}")));
    lines.push(format!("- fabric analysis: {}", quote.fabric_analysis));

    if let Some(sources) = quote.sources.as_ref().filter(|sources| !sources.is_empty()) {
        lines.push("- sources:".to_string());
        lines.extend(
            sources.iter().map(|source| format!("    * {} <{}>", source.title, source.uri)),
        );
    }

    lines.push(format!("- reference: {}", appraisal.submission_id));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use atelier_core::{Appraisal, Complexity, QuoteResult, SourceCitation};
    use tempfile::TempDir;

    use super::{encode_swatch, render_appraisal};

    #[test]
    fn swatch_is_encoded_as_data_url_with_mime_from_extension() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("swatch.PNG");
        fs::write(&path, b"swatch").expect("write swatch");

        let encoded = encode_swatch(&path).expect("encode");
        assert_eq!(encoded, "data:image/png;base64,c3dhdGNo");
    }

    #[test]
    fn missing_or_empty_swatch_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        assert!(encode_swatch(&dir.path().join("absent.jpg")).is_err());

        let empty = dir.path().join("empty.jpg");
        fs::write(&empty, b"").expect("write empty");
        let error = encode_swatch(&empty).expect_err("empty file");
        assert!(error.to_string().contains("is empty"));
    }

    #[test]
    fn appraisal_rendering_lists_breakdown_and_sources() {
        let appraisal = Appraisal {
            submission_id: "sub-1".to_string(),
            quote: QuoteResult {
                estimated_price: "$2,400".to_string(),
                labor_hours: "40 hours".to_string(),
                complexity: Complexity::High,
                breakdown: vec!["Pattern drafting".to_string(), "Beading".to_string()],
                fabric_analysis: "Charmeuse slips; stabilize seams.".to_string(),
                sources: Some(vec![SourceCitation {
                    title: "Mood Fabrics".to_string(),
                    uri: "https://www.moodfabrics.com".to_string(),
                }]),
            },
            preview: None,
        };

        let rendered = render_appraisal(&appraisal);
        assert!(rendered.contains("- estimated price: $2,400"));
        assert!(rendered.contains("- complexity: High"));
        assert!(rendered.contains("    * Beading"));
        assert!(rendered.contains("    * Mood Fabrics <https://www.moodfabrics.com>"));
        assert!(rendered.ends_with("- reference: sub-1"));
    }
}
