use serde::{Deserialize, Serialize};

use crate::domain::image::InlineImage;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
    Exquisite,
}

impl Complexity {
    pub const ALL: &'static [Complexity] =
        &[Self::Low, Self::Medium, Self::High, Self::Exquisite];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Exquisite => "Exquisite",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web page the service cited while grounding a link-sourced fabric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub title: String,
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub estimated_price: String,
    pub labor_hours: String,
    pub complexity: Complexity,
    pub breakdown: Vec<String>,
    pub fabric_analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceCitation>>,
}

impl QuoteResult {
    /// Parses the structured payload the analysis model returns.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let trimmed = strip_code_fence(trimmed);
        serde_json::from_str(trimmed).map_err(|error| {
            DomainError::InvariantViolation(format!("malformed quote payload: {error}"))
        })
    }

    pub fn with_sources(mut self, sources: Vec<SourceCitation>) -> Self {
        self.sources = Some(sources);
        self
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Everything a successful submission hands back to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appraisal {
    pub submission_id: String,
    pub quote: QuoteResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<InlineImage>,
}

#[cfg(test)]
mod tests {
    use super::{Complexity, QuoteResult, SourceCitation};

    const PAYLOAD: &str = r#"{
        "estimatedPrice": "$2,400",
        "laborHours": "38-42 hours",
        "complexity": "High",
        "breakdown": ["Pattern drafting", "Bias-cut panels"],
        "fabricAnalysis": "Silk charmeuse drapes fluidly."
    }"#;

    #[test]
    fn parses_structured_payload() {
        let quote = QuoteResult::from_json(PAYLOAD).expect("payload should parse");
        assert_eq!(quote.estimated_price, "$2,400");
        assert_eq!(quote.complexity, Complexity::High);
        assert_eq!(quote.breakdown.len(), 2);
        assert!(quote.sources.is_none());
    }

    #[test]
    fn tolerates_fenced_json() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert!(QuoteResult::from_json(&fenced).is_ok());
    }

    #[test]
    fn rejects_unknown_complexity() {
        let payload = PAYLOAD.replace("\"High\"", "\"Extreme\"");
        assert!(QuoteResult::from_json(&payload).is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        let payload = r#"{"estimatedPrice": "$900", "complexity": "Low"}"#;
        assert!(QuoteResult::from_json(payload).is_err());
    }

    #[test]
    fn sources_are_title_uri_pairs() {
        let quote = QuoteResult::from_json(PAYLOAD)
            .expect("payload should parse")
            .with_sources(vec![SourceCitation {
                title: "Mood Fabrics".to_string(),
                uri: "https://moodfabrics.com/silk".to_string(),
            }]);
        let json = serde_json::to_value(&quote).expect("serialize");
        assert_eq!(json["sources"][0]["title"], "Mood Fabrics");
        assert_eq!(json["sources"][0]["uri"], "https://moodfabrics.com/silk");
    }
}
