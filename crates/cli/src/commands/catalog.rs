use atelier_core::domain::garment::{DEFAULT_LENGTH, DEFAULT_NECKLINE, DEFAULT_SLEEVE_STYLE};
use atelier_core::{Category, FabricSourceType, Length, Neckline, SleeveStyle};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct CatalogReport {
    categories: Vec<CategoryEntry>,
    necklines: Vec<&'static str>,
    sleeve_styles: Vec<&'static str>,
    lengths: Vec<&'static str>,
    fabric_sources: Vec<&'static str>,
    defaults: Defaults,
}

#[derive(Debug, Serialize)]
struct CategoryEntry {
    name: &'static str,
    upper_garment: bool,
    silhouettes: Vec<&'static str>,
    default_silhouette: &'static str,
    neckline: bool,
    sleeve_style: bool,
    length: bool,
}

#[derive(Debug, Serialize)]
struct Defaults {
    neckline: &'static str,
    sleeve_style: &'static str,
    length: &'static str,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();

    if json_output {
        return match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("catalog", "serialization", error.to_string(), 1),
        };
    }

    CommandResult { exit_code: 0, output: render_human(&report) }
}

fn build_report() -> CatalogReport {
    let categories = Category::ALL
        .iter()
        .map(|&category| {
            let requirements = category.requirements();
            CategoryEntry {
                name: category.label(),
                upper_garment: category.is_upper_garment(),
                silhouettes: requirements.silhouettes.iter().map(|value| value.label()).collect(),
                default_silhouette: requirements.default_silhouette().label(),
                neckline: requirements.neckline,
                sleeve_style: requirements.sleeve_style,
                length: requirements.length,
            }
        })
        .collect();

    CatalogReport {
        categories,
        necklines: Neckline::ALL.iter().map(|value| value.label()).collect(),
        sleeve_styles: SleeveStyle::ALL.iter().map(|value| value.label()).collect(),
        lengths: Length::ALL.iter().map(|value| value.label()).collect(),
        fabric_sources: FabricSourceType::ALL.iter().map(|value| value.as_str()).collect(),
        defaults: Defaults {
            neckline: DEFAULT_NECKLINE.label(),
            sleeve_style: DEFAULT_SLEEVE_STYLE.label(),
            length: DEFAULT_LENGTH.label(),
        },
    }
}

fn render_human(report: &CatalogReport) -> String {
    let mut lines = vec!["garment catalog:".to_string()];

    for entry in &report.categories {
        let mut details = Vec::new();
        if entry.neckline {
            details.push("neckline");
        }
        if entry.sleeve_style {
            details.push("sleeve style");
        }
        if entry.length {
            details.push("length");
        }
        lines.push(format!(
            "- {} ({}): {}",
            entry.name,
            if entry.upper_garment { "upper garment" } else { "lower garment" },
            entry.silhouettes.join(", ")
        ));
        lines.push(format!("    details: {}", details.join(", ")));
    }

    lines.push(format!("necklines: {}", report.necklines.join(", ")));
    lines.push(format!("sleeve styles: {}", report.sleeve_styles.join(", ")));
    lines.push(format!("lengths: {}", report.lengths.join(", ")));
    lines.push(format!("fabric sources: {}", report.fabric_sources.join(", ")));
    lines.join("\n")
}
