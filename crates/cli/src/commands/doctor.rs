use atelier_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

/// Google AI Studio keys are 39 characters starting with `AIza`.
const API_KEY_PREFIX: &str = "AIza";
const API_KEY_LEN: usize = 39;

/// Any failed readiness check exits with the config failure code.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = match report.overall_status {
        CheckStatus::Pass => 0,
        CheckStatus::Fail | CheckStatus::Skipped => EXIT_CONFIG,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_api_key(&config));
            checks.push(check_endpoints(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["api_key_readiness", "model_endpoints"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_api_key(config: &AppConfig) -> DoctorCheck {
    let key = config.llm.api_key.as_ref().map(|key| key.expose_secret().trim().to_string());
    let (status, details) = match key.as_deref() {
        None | Some("") => (CheckStatus::Fail, "no API key configured".to_string()),
        Some(key) if key.starts_with(API_KEY_PREFIX) && key.len() == API_KEY_LEN => {
            (CheckStatus::Pass, "API key has the expected Google AI Studio shape".to_string())
        }
        Some(_) => (
            CheckStatus::Fail,
            format!(
                "API key does not look like a Google AI Studio key \
                 (expected {API_KEY_LEN} characters starting with `{API_KEY_PREFIX}`)"
            ),
        ),
    };

    DoctorCheck { name: "api_key_readiness", status, details }
}

fn check_endpoints(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "model_endpoints",
        status: CheckStatus::Pass,
        details: format!(
            "analysis via `{}`, illustration via `{}` (timeout {}s)",
            config.generate_content_url(&config.llm.analysis_model),
            config.generate_content_url(&config.llm.image_model),
            config.llm.timeout_secs
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
