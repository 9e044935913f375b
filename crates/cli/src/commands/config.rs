use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use atelier_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

/// Env keys consulted for each config path, highest priority first.
const FIELD_ENV_KEYS: &[(&str, &[&str])] = &[
    ("llm.api_key", &["ATELIER_LLM_API_KEY", "GEMINI_API_KEY"]),
    ("llm.base_url", &["ATELIER_LLM_BASE_URL"]),
    ("llm.analysis_model", &["ATELIER_LLM_ANALYSIS_MODEL"]),
    ("llm.image_model", &["ATELIER_LLM_IMAGE_MODEL"]),
    ("llm.timeout_secs", &["ATELIER_LLM_TIMEOUT_SECS"]),
    ("progress.interval_ms", &["ATELIER_PROGRESS_INTERVAL_MS"]),
    ("logging.level", &["ATELIER_LOGGING_LEVEL", "ATELIER_LOG_LEVEL"]),
    ("logging.format", &["ATELIER_LOGGING_FORMAT", "ATELIER_LOG_FORMAT"]),
];

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult {
                exit_code: EXIT_CONFIG,
                output: format!("config validation failed: {error}"),
            }
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    let values = [
        api_key,
        config.llm.base_url.clone(),
        config.llm.analysis_model.clone(),
        config.llm.image_model.clone(),
        config.llm.timeout_secs.to_string(),
        config.progress.interval_ms.to_string(),
        config.logging.level.clone(),
        format!("{:?}", config.logging.format),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for ((key_path, env_keys), value) in FIELD_ENV_KEYS.iter().zip(values.iter()) {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("atelier.toml"), PathBuf::from("config/atelier.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the four-character prefix Google keys share (`AIza`) so a pasted
/// token of the wrong kind is still recognizable.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.get(..4) {
        Some(prefix) if trimmed.len() > 8 => format!("{prefix}***"),
        _ => "<redacted>".to_string(),
    }
}
