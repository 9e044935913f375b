use serde::{Deserialize, Serialize};

/// Mime type assumed for uploads whose `data:` header omits one.
pub const DEFAULT_UPLOAD_MIME_TYPE: &str = "image/jpeg";

/// A base64-encoded image held in memory, either a fabric swatch the user
/// supplied or a concept illustration returned by the generative service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), data: data.into() }
    }

    /// Accepts `data:<mime>;base64,<payload>` or a bare base64 payload.
    /// Returns `None` when no payload is present.
    pub fn from_data_url(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (mime_type, payload) = match raw.split_once(',') {
            Some((header, payload)) => {
                let mime_type = header
                    .strip_prefix("data:")
                    .and_then(|rest| rest.split(';').next())
                    .map(str::trim)
                    .filter(|mime| !mime.is_empty())
                    .unwrap_or(DEFAULT_UPLOAD_MIME_TYPE);
                (mime_type, payload.trim())
            }
            None => (DEFAULT_UPLOAD_MIME_TYPE, raw),
        };

        if payload.is_empty() {
            return None;
        }

        Some(Self::new(mime_type, payload))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}
