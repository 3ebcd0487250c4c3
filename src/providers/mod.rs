/*!
 * Backend implementations for the remote translation endpoint.
 *
 * The pipeline talks to the endpoint through the [`TranslationBackend`]
 * trait so tests can substitute scripted backends for the real client:
 * - Gemini: `generateContent` image-editing endpoint
 */

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::TranslationError;
use crate::providers::gemini::{GenerateContentRequest, GenerateContentResponse};

/// Common trait for remote translation backends.
///
/// A backend dispatches one wire request and returns either the decoded
/// response body or an already-classified taxonomy error; the retry policy
/// lives in the pipeline, not here.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Dispatch one request to the endpoint.
    async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse, TranslationError>;

    /// Short backend name for log lines.
    fn name(&self) -> &str;
}

pub mod gemini;
