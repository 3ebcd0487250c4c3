/*!
 * Error types for the screentrans pipeline.
 *
 * This module contains the closed error taxonomy governing retry behavior,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur during a translation call.
///
/// Every failure leaving the pipeline is one of these kinds; no raw transport
/// or parsing error crosses the boundary unclassified. Retryability is a pure
/// function of the kind, consulted by the pipeline before each retry decision.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Credentials or configuration missing or invalid. Non-retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The endpoint's response could not be parsed or lacked required content. Non-retryable.
    #[error("Invalid response from endpoint: {0}")]
    InvalidResponse(String),

    /// The endpoint signaled throttling (HTTP 429). Retryable.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Connectivity or transport failure, or unclassified non-2xx status. Retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline or the endpoint signaled a timeout status. Retryable.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any uncategorized failure. Retryable as a conservative default.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl TranslationError {
    /// Classify a non-success HTTP status code into a taxonomy kind.
    ///
    /// 401/403 map to `Configuration`, 429 to `RateLimitExceeded`, 408/504
    /// to `Timeout`, and anything else to `Network`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Configuration(format!("endpoint rejected credentials ({status}): {message}")),
            429 => Self::RateLimitExceeded(format!("endpoint throttled the request: {message}")),
            408 | 504 => Self::Timeout(format!("endpoint signaled timeout ({status}): {message}")),
            _ => Self::Network(format!("endpoint returned status {status}: {message}")),
        }
    }

    /// Whether the pipeline may retry after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::InvalidResponse(_) => false,
            Self::RateLimitExceeded(_) | Self::Network(_) | Self::Timeout(_) | Self::Unknown(_) => true,
        }
    }

    /// Fixed, kind-specific message suitable for surfacing to a user.
    ///
    /// `Unknown` includes the underlying message verbatim for diagnosability.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "Translation is not configured. Check your API key.".to_string(),
            Self::InvalidResponse(_) => "The translation service returned an unusable response.".to_string(),
            Self::RateLimitExceeded(_) => "Too many requests. Please wait a moment and try again.".to_string(),
            Self::Network(_) => "Could not reach the translation service. Check your connection.".to_string(),
            Self::Timeout(_) => "The translation service took too long to respond.".to_string(),
            Self::Unknown(detail) => format!("Translation failed: {detail}"),
        }
    }
}

/// Errors that can occur while compressing an image for transmission.
///
/// The compressor degrades quality and size rather than erroring out, so this
/// set is deliberately small: only degenerate input makes it fail.
#[derive(Error, Debug)]
pub enum CompressionError {
    /// Input image has a zero-pixel dimension.
    #[error("Cannot compress a {width}x{height} image")]
    EmptyImage {
        /// Input width in pixels
        width: u32,
        /// Input height in pixels
        height: u32,
    },

    /// The JPEG encoder rejected the image.
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

impl From<CompressionError> for TranslationError {
    fn from(error: CompressionError) -> Self {
        Self::Unknown(error.to_string())
    }
}
