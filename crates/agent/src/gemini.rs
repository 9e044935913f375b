//! Minimal client for the Gemini `generateContent` REST endpoint, covering the
//! two calls the atelier makes: a schema-constrained JSON analysis and a single
//! image generation.

use std::time::Duration;

use async_trait::async_trait;
use atelier_core::config::AppConfig;
use atelier_core::{Complexity, InlineImage, QuoteResult, SourceCitation};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{GenerationError, ServiceCall};
use crate::llm::LlmClient;
use crate::prompts::{AnalysisRequest, ImageRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    analysis_url: String,
    image_url: String,
}

impl GeminiClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .llm
            .api_key
            .clone()
            .ok_or_else(|| GenerationError::Setup("llm.api_key is not configured".to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|error| GenerationError::Setup(error.to_string()))?;

        Ok(Self {
            http,
            api_key,
            analysis_url: config.generate_content_url(&config.llm.analysis_model),
            image_url: config.generate_content_url(&config.llm.image_model),
        })
    }

    async fn generate(
        &self,
        call: ServiceCall,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = match call {
            ServiceCall::Analysis => &self.analysis_url,
            ServiceCall::Image => &self.image_url,
        };
        debug!(
            event_name = "atelier.gemini.request",
            call = %call,
            url = %url,
            "calling generateContent"
        );

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|source| GenerationError::Transport { call, source })?;

        let status = response.status();
        let text =
            response.text().await.map_err(|source| GenerationError::Transport { call, source })?;
        if !status.is_success() {
            return Err(GenerationError::Status { call, code: status.as_u16(), body: text });
        }

        serde_json::from_str(&text).map_err(|error| GenerationError::MalformedResponse {
            call,
            reason: error.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<QuoteResult, GenerationError> {
        let body = analysis_body(request);
        let response = self.generate(ServiceCall::Analysis, &body).await?;
        quote_from_response(&response)
    }

    async fn render_preview(
        &self,
        request: &ImageRequest,
    ) -> Result<Option<InlineImage>, GenerationError> {
        let body = image_body(request);
        let response = self.generate(ServiceCall::Image, &body).await?;
        Ok(response.first_image())
    }
}

fn analysis_body(request: &AnalysisRequest) -> GenerateContentRequest {
    let mut parts = vec![RequestPart::Text { text: request.prompt.clone() }];
    if let Some(swatch) = &request.swatch {
        parts.push(RequestPart::InlineData { inline_data: swatch.clone() });
    }

    GenerateContentRequest {
        contents: vec![RequestContent { parts }],
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(quote_schema()),
            image_config: None,
        }),
        tools: if request.grounded {
            vec![Tool { google_search: GoogleSearch {} }]
        } else {
            Vec::new()
        },
    }
}

fn image_body(request: &ImageRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart::Text { text: request.prompt.clone() }],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: None,
            response_schema: None,
            image_config: Some(ImageConfig { aspect_ratio: request.aspect_ratio.to_string() }),
        }),
        tools: Vec::new(),
    }
}

fn quote_schema() -> Value {
    let complexity: Vec<&str> = Complexity::ALL.iter().map(|level| level.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "estimatedPrice": { "type": "STRING" },
            "laborHours": { "type": "STRING" },
            "complexity": { "type": "STRING", "enum": complexity },
            "breakdown": { "type": "ARRAY", "items": { "type": "STRING" } },
            "fabricAnalysis": { "type": "STRING" }
        },
        "required": ["estimatedPrice", "laborHours", "complexity", "breakdown", "fabricAnalysis"]
    })
}

fn quote_from_response(response: &GenerateContentResponse) -> Result<QuoteResult, GenerationError> {
    let call = ServiceCall::Analysis;
    let text = response.text().ok_or(GenerationError::EmptyResponse { call })?;
    let quote = QuoteResult::from_json(&text)
        .map_err(|error| GenerationError::MalformedResponse { call, reason: error.to_string() })?;

    Ok(match response.citations() {
        Some(sources) => quote.with_sources(sources),
        None => quote,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineImage>,
    thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Answer text with thought summaries skipped; `None` when empty.
    fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn first_image(&self) -> Option<InlineImage> {
        self.parts().find_map(|part| part.inline_data.clone())
    }

    fn citations(&self) -> Option<Vec<SourceCitation>> {
        let metadata = self.candidates.first()?.grounding_metadata.as_ref()?;
        let citations = metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.clone()?;
                let title = web.title.clone().unwrap_or_else(|| uri.clone());
                Some(SourceCitation { title, uri })
            })
            .collect();
        Some(citations)
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::InlineImage;
    use serde_json::json;

    use super::{analysis_body, image_body, quote_from_response, GenerateContentResponse};
    use crate::error::GenerationError;
    use crate::prompts::{AnalysisRequest, ImageRequest};

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("response fixture should deserialize")
    }

    #[test]
    fn analysis_body_requests_schema_constrained_json() {
        let body = analysis_body(&AnalysisRequest {
            prompt: "analyze".to_string(),
            swatch: None,
            grounded: false,
        });
        let value = serde_json::to_value(&body).expect("serialize");

        assert_eq!(value["contents"][0]["parts"][0]["text"], "analyze");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            value["generationConfig"]["responseSchema"]["properties"]["complexity"]["enum"],
            json!(["Low", "Medium", "High", "Exquisite"])
        );
        assert!(value.get("tools").is_none(), "ungrounded requests carry no tools");
    }

    #[test]
    fn grounded_analysis_adds_google_search_and_swatch_part() {
        let body = analysis_body(&AnalysisRequest {
            prompt: "analyze".to_string(),
            swatch: Some(InlineImage::new("image/jpeg", "c3dhdGNo")),
            grounded: true,
        });
        let value = serde_json::to_value(&body).expect("serialize");

        assert_eq!(value["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["data"], "c3dhdGNo");
    }

    #[test]
    fn image_body_sets_portrait_aspect_ratio() {
        let body = image_body(&ImageRequest { prompt: "draw".to_string(), aspect_ratio: "3:4" });
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["generationConfig"]["imageConfig"]["aspectRatio"], "3:4");
        assert!(value["generationConfig"].get("responseSchema").is_none());
    }

    const SATIN_QUOTE: &str = r#"{"estimatedPrice":"$3,100","laborHours":"52 hours",
        "complexity":"Exquisite","breakdown":["Corsetry"],
        "fabricAnalysis":"Heavy duchess satin."}"#;

    #[test]
    fn quote_is_read_from_text_parts_with_citations() {
        let response = response(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": SATIN_QUOTE }
                ]},
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://example.com/satin", "title": "Duchess Satin" } },
                    { "retrievedContext": {} }
                ]}
            }]
        }));

        let quote = quote_from_response(&response).expect("quote");
        assert_eq!(quote.estimated_price, "$3,100");
        let sources = quote.sources.expect("sources");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "Duchess Satin");
        assert_eq!(sources[0].uri, "https://example.com/satin");
    }

    #[test]
    fn empty_candidates_are_an_empty_response() {
        let error = quote_from_response(&response(json!({ "candidates": [] })))
            .expect_err("no text to parse");
        assert!(matches!(error, GenerationError::EmptyResponse { .. }));
    }

    #[test]
    fn unparsable_text_is_malformed() {
        let response = response(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot help with that." }] } }]
        }));
        let error = quote_from_response(&response).expect_err("not json");
        assert!(matches!(error, GenerationError::MalformedResponse { .. }));
    }

    #[test]
    fn first_inline_image_becomes_the_preview() {
        let response = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your illustration." },
                { "inlineData": { "mimeType": "image/png", "data": "aW1n" } }
            ]}}]
        }));
        let image = response.first_image().expect("image part");
        assert_eq!(image.to_data_url(), "data:image/png;base64,aW1n");
    }
}
