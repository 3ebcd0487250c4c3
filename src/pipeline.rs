/*!
 * Translation request pipeline.
 *
 * Orchestrates one call end to end: acquire the concurrency gate, compress
 * the image once, build the wire request, dispatch with retry and backoff,
 * and extract the normalized outcome. All failures leave this module as
 * classified [`TranslationError`] kinds.
 */

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};

use crate::app_config::Config;
use crate::compression::{self, EncodedPayload};
use crate::errors::TranslationError;
use crate::extraction::{self, TranslationOutcome};
use crate::gate::RequestGate;
use crate::providers::TranslationBackend;
use crate::providers::gemini::{GeminiBackend, GenerateContentRequest};

/// Answer shapes requested from the endpoint.
const RESPONSE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

/// Pipeline for translating screen captures through a remote endpoint.
pub struct TranslationPipeline {
    /// Remote endpoint implementation
    backend: Arc<dyn TranslationBackend>,

    /// Shared gate bounding concurrency and dispatch rate
    gate: Arc<RequestGate>,

    /// Configuration for the pipeline
    pub config: Config,
}

impl TranslationPipeline {
    /// Create a pipeline against the Gemini endpoint, sharing the given gate.
    pub fn new(config: Config, gate: Arc<RequestGate>) -> Result<Self, TranslationError> {
        let backend = Arc::new(GeminiBackend::new(
            config.resolved_api_key(),
            config.endpoint.clone(),
            config.model.clone(),
            config.timeout_secs,
        )?);
        Ok(Self {
            backend,
            gate,
            config,
        })
    }

    /// Create a pipeline with an explicit backend implementation.
    pub fn with_backend(config: Config, backend: Arc<dyn TranslationBackend>, gate: Arc<RequestGate>) -> Self {
        Self {
            backend,
            gate,
            config,
        }
    }

    /// Create a gate sized from the configuration, for callers that do not
    /// already share one.
    pub fn gate_from_config(config: &Config) -> Arc<RequestGate> {
        Arc::new(RequestGate::new(
            config.gate.max_in_flight,
            Duration::from_millis(config.gate.min_interval_ms),
        ))
    }

    /// Translate one captured image, returning the normalized outcome.
    ///
    /// Suspends at the gate, at the inter-dispatch interval, during the
    /// network call and during backoff waits. The image is compressed once;
    /// the same encoded payload is reused across every retry attempt.
    pub async fn translate(&self, image: &DynamicImage) -> Result<TranslationOutcome, TranslationError> {
        // Precondition: credentials must exist before any permit is taken.
        if self.config.resolved_api_key().is_empty() {
            return Err(TranslationError::Configuration(
                "no API key configured".to_string(),
            ));
        }

        let _permit = self.gate.acquire().await;

        let payload = compression::compress(image, &self.config.compression)?;
        let digest = payload_digest(&payload.bytes);
        info!(
            "[{}] compressed capture to {}x{} ({} bytes) for {}",
            digest,
            payload.width,
            payload.height,
            payload.len(),
            self.backend.name()
        );

        let request = build_request(&self.config.instruction, &payload);
        let max_attempts = self.config.retry.retry_count as u64 + 1;
        let mut last_error: Option<TranslationError> = None;

        for attempt in 0..max_attempts {
            match self.backend.generate(&request).await {
                Ok(response) => {
                    debug!("[{}] attempt {}/{} succeeded", digest, attempt + 1, max_attempts);
                    return extraction::extract_outcome(&response, true);
                }
                Err(e) if !e.is_retryable() => {
                    warn!("[{}] non-retryable failure: {}", digest, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "[{}] attempt {}/{} failed: {}",
                        digest,
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt + 1 < max_attempts {
                        let backoff = Duration::from_millis(
                            self.config.retry.backoff_base_ms * (attempt + 1).pow(2),
                        );
                        debug!("[{}] backing off for {:?}", digest, backoff);
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TranslationError::Unknown("translation failed with no recorded error".to_string())
        }))
    }
}

/// Build the wire request for one encoded payload.
///
/// The request is immutable once built and shared across retry attempts.
fn build_request(instruction: &str, payload: &EncodedPayload) -> GenerateContentRequest {
    GenerateContentRequest::new()
        .add_inline_data(payload.mime_type, STANDARD.encode(&payload.bytes))
        .add_text(instruction)
        .response_modalities(RESPONSE_MODALITIES)
}

/// Short sha256 digest of a payload, used to correlate log lines of one call.
pub fn payload_digest(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
