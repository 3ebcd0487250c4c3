/*!
 * Scripted mock backends for testing pipeline behavior.
 *
 * A `ScriptedBackend` plays back a fixed sequence of results, one per
 * dispatch, and records what it was asked to send so tests can assert on
 * attempt counts and payload reuse.
 */

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use screentrans::errors::TranslationError;
use screentrans::providers::TranslationBackend;
use screentrans::providers::gemini::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};

/// One scripted dispatch result.
pub type ScriptedResult = Result<GenerateContentResponse, TranslationError>;

/// Backend that returns pre-scripted results in order.
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptedResult>>,
    calls: AtomicUsize,
    seen_payloads: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Create a backend that plays back `script` one entry per dispatch.
    pub fn new(script: Vec<ScriptedResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            seen_payloads: Mutex::new(Vec::new()),
        }
    }

    /// Number of dispatches made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Base64 inline payloads observed, one entry per dispatch.
    pub fn seen_payloads(&self) -> Vec<String> {
        self.seen_payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn generate(&self, request: &GenerateContentRequest) -> ScriptedResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let inline = request.contents.iter().flat_map(|c| c.parts.iter()).find_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data.data.clone()),
            Part::Text { .. } => None,
        });
        if let Some(data) = inline {
            self.seen_payloads.lock().unwrap().push(data);
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TranslationError::Unknown("script exhausted".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Build a response carrying an inline image part and optional commentary.
pub fn image_response(data_base64: impl Into<String>, commentary: Option<&str>) -> GenerateContentResponse {
    let mut parts = vec![Part::InlineData {
        inline_data: InlineData {
            mime_type: "image/png".to_string(),
            data: data_base64.into(),
        },
    }];
    if let Some(text) = commentary {
        parts.push(Part::Text {
            text: text.to_string(),
        });
    }
    response_with_parts(parts)
}

/// Build a response carrying a single text part.
pub fn text_response(text: impl Into<String>) -> GenerateContentResponse {
    response_with_parts(vec![Part::Text { text: text.into() }])
}

fn response_with_parts(parts: Vec<Part>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Content {
                role: Some("model".to_string()),
                parts,
            },
        }],
    }
}
