use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;
use crate::providers::TranslationBackend;

/// Default public endpoint for the Gemini API.
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini client for the `generateContent` image-editing endpoint.
pub struct GeminiBackend {
    /// HTTP client for API requests
    client: Client,
    /// API key supplied as the `key` query parameter
    api_key: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Model identifier, e.g. `gemini-2.0-flash-exp`
    model: String,
}

/// Request body for `generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Conversation contents; a single user turn for this pipeline
    pub contents: Vec<Content>,

    /// Generation options, notably the requested response modalities
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Content container shared between requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Role of the turn (user, model)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Ordered content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Untagged union of inline-data and text content parts.
///
/// The endpoint has historically emitted the inline-data key in both snake
/// and camel case; both spellings decode into the same variant. Inline data
/// is tried first so a part carrying both keys resolves as an image part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Base64 binary payload
    InlineData {
        /// The inline payload
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },

    /// Free text
    Text {
        /// The text content
        text: String,
    },
}

/// Base64 inline payload used for image parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    /// MIME type of the encoded bytes
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,

    /// Base64-encoded bytes
    pub data: String,
}

/// Generation options for the request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    /// Expected answer shapes, e.g. `["TEXT", "IMAGE"]`
    #[serde(rename = "responseModalities")]
    pub response_modalities: Vec<String>,
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    /// Candidate completions; the first one carries the result
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    /// Content of the candidate
    pub content: Content,
}

impl GenerateContentRequest {
    /// Create an empty request with a single user turn.
    pub fn new() -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: Vec::new(),
            }],
            generation_config: None,
        }
    }

    /// Append a free-text part.
    pub fn add_text(mut self, text: impl Into<String>) -> Self {
        self.contents[0].parts.push(Part::Text { text: text.into() });
        self
    }

    /// Append an inline binary part from already base64-encoded data.
    pub fn add_inline_data(mut self, mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        self.contents[0].parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        });
        self
    }

    /// Set the requested response modalities.
    pub fn response_modalities(mut self, modalities: &[&str]) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_modalities: modalities.iter().map(|m| m.to_string()).collect(),
        });
        self
    }
}

impl Default for GenerateContentRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiBackend {
    /// Create a new Gemini client.
    ///
    /// Fails if the HTTP client cannot be built, rather than falling back to
    /// a client without the configured timeout.
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TranslationError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    fn api_url(&self) -> String {
        let base = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/v1beta/models/{}:generateContent", base, self.model)
    }

    /// Test the connection to the endpoint with a minimal text request.
    pub async fn probe(&self) -> Result<(), TranslationError> {
        let request = GenerateContentRequest::new()
            .add_text("ping")
            .response_modalities(&["TEXT"]);
        self.generate(&request).await?;
        Ok(())
    }
}

#[async_trait]
impl TranslationBackend for GeminiBackend {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse, TranslationError> {
        let api_url = self.api_url();
        debug!("Dispatching generateContent to {}", api_url);

        let response = self
            .client
            .post(&api_url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::Timeout(format!("request to Gemini API timed out: {e}"))
                } else {
                    TranslationError::Network(format!("failed to reach Gemini API: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(TranslationError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| TranslationError::InvalidResponse(format!("failed to parse Gemini API response: {e}")))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
