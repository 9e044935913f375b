use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atelier_core::{
    Appraisal, Category, DesignField, DesignWizard, FabricSourceType, InlineImage, Length,
    Neckline, Silhouette, SleeveStyle, WizardStep,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::commands::{
    encode_swatch, render_appraisal, start_session, submit_with_progress, CommandResult,
    EXIT_INVALID_INPUT, EXIT_SUBMISSION,
};

#[derive(Debug, Clone, Default, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Garment category: dress, top, skirt, pants, jumpsuit")]
    pub category: String,
    #[arg(long, help = "Silhouette; defaults to the category's first option")]
    pub silhouette: Option<String>,
    #[arg(long, help = "Neckline (upper garments only)")]
    pub neckline: Option<String>,
    #[arg(long, help = "Sleeve style (upper garments only)")]
    pub sleeve: Option<String>,
    #[arg(long, help = "Garment length")]
    pub length: Option<String>,
    #[arg(long, group = "fabric", help = "Free-text fabric description")]
    pub fabric_description: Option<String>,
    #[arg(long, group = "fabric", help = "URL of a fabric product page")]
    pub fabric_link: Option<String>,
    #[arg(long, group = "fabric", help = "Path to a fabric swatch image")]
    pub fabric_image: Option<PathBuf>,
    #[arg(long, help = "Additional construction notes")]
    pub notes: Option<String>,
    #[arg(long, help = "Write the concept illustration to this path")]
    pub preview_out: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct QuoteOutput<'a> {
    command: &'static str,
    status: &'static str,
    #[serde(flatten)]
    appraisal: &'a Appraisal,
    #[serde(skip_serializing_if = "Option::is_none")]
    preview_path: Option<String>,
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let session = match start_session("quote") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let mut wizard = match build_wizard(&args) {
        Ok(wizard) => wizard,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "invalid_input",
                format!("{error:#}"),
                EXIT_INVALID_INPUT,
            )
        }
    };

    let submitted = session.runtime.block_on(submit_with_progress(
        &session.orchestrator,
        &mut wizard,
        !args.json,
    ));
    if let Err(error) = submitted {
        return CommandResult::submission_failure("quote", error);
    }
    let Some(appraisal) = wizard.appraisal() else {
        return CommandResult::failure(
            "quote",
            "submission_failed",
            atelier_core::SUBMISSION_FAILED_MESSAGE,
            EXIT_SUBMISSION,
        );
    };

    let preview_path = match (&args.preview_out, &appraisal.preview) {
        (Some(path), Some(preview)) => match write_preview(path, preview) {
            Ok(written) => Some(written),
            Err(error) => {
                return CommandResult::failure(
                    "quote",
                    "preview_write",
                    format!("{error:#}"),
                    EXIT_SUBMISSION,
                )
            }
        },
        _ => None,
    };

    if args.json {
        let output = QuoteOutput {
            command: "quote",
            status: "ok",
            appraisal,
            preview_path: preview_path.as_ref().map(|path| path.display().to_string()),
        };
        return match serde_json::to_string_pretty(&output) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("quote", "serialization", error.to_string(), 1),
        };
    }

    let mut output = render_appraisal(appraisal);
    match (&preview_path, &appraisal.preview) {
        (Some(path), _) => output.push_str(&format!("\n- preview: {}", path.display())),
        (None, Some(_)) => output.push_str("\n- preview: available (pass --preview-out to save)"),
        (None, None) => output.push_str("\n- preview: not generated"),
    }
    CommandResult { exit_code: 0, output }
}

/// Applies the flags through the same state machine the interactive wizard
/// uses and leaves it ready to submit.
pub fn build_wizard(args: &QuoteArgs) -> anyhow::Result<DesignWizard> {
    let mut wizard = DesignWizard::new();

    let category: Category = args.category.parse()?;
    wizard.set_category(category)?;

    if let Some(silhouette) = &args.silhouette {
        wizard.set_field(DesignField::Silhouette(silhouette.parse::<Silhouette>()?))?;
    }
    if let Some(neckline) = &args.neckline {
        wizard.set_field(DesignField::Neckline(neckline.parse::<Neckline>()?))?;
    }
    if let Some(sleeve) = &args.sleeve {
        wizard.set_field(DesignField::SleeveStyle(sleeve.parse::<SleeveStyle>()?))?;
    }
    if let Some(length) = &args.length {
        wizard.set_field(DesignField::Length(length.parse::<Length>()?))?;
    }

    let fabric = if let Some(description) = &args.fabric_description {
        Some((FabricSourceType::Description, description.clone()))
    } else if let Some(link) = &args.fabric_link {
        Some((FabricSourceType::Link, link.clone()))
    } else if let Some(path) = &args.fabric_image {
        Some((FabricSourceType::Upload, encode_swatch(path)?))
    } else {
        None
    };
    if let Some((source, data)) = fabric {
        wizard.set_field(DesignField::FabricSource(source))?;
        wizard.set_field(DesignField::FabricData(data))?;
    }

    if let Some(notes) = &args.notes {
        wizard.set_field(DesignField::Notes(notes.clone()))?;
    }

    while wizard.step() < WizardStep::Finalize {
        wizard.advance();
    }
    Ok(wizard)
}

fn write_preview(path: &Path, preview: &InlineImage) -> anyhow::Result<PathBuf> {
    let path = if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(preview.file_extension())
    };

    let bytes = STANDARD.decode(preview.data.trim()).context("preview payload is not base64")?;
    fs::write(&path, bytes)
        .with_context(|| format!("could not write preview to `{}`", path.display()))?;
    info!(
        event_name = "atelier.cli.preview_written",
        path = %path.display(),
        mime_type = %preview.mime_type,
        "concept illustration saved"
    );
    Ok(path)
}
