/*!
 * # screentrans - screen-region image translation core
 *
 * A Rust library implementing the request pipeline of a screen-capture
 * translation tool: captures of a screen region are compressed into a byte
 * budget, sent to a remote image-editing translation endpoint, and the
 * returned edited image (or structured text translation) is normalized for
 * the caller.
 *
 * ## Features
 *
 * - Two-pass image compression (prescale + binary-search quality) into a
 *   configurable byte budget
 * - Rate-limited, retrying endpoint client with exponential backoff
 * - Closed error taxonomy governing retry vs. fail-fast behavior
 * - Tolerant response extraction for both text-only and image-editing
 *   endpoint variants
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `compression`: Size-bounded image encoding
 * - `gate`: Concurrency gate and dispatch-interval limiter
 * - `pipeline`: The translation request pipeline
 * - `extraction`: Response payload classification and normalization
 * - `providers`: Client implementations for remote endpoints:
 *   - `providers::gemini`: Gemini `generateContent` client
 * - `errors`: The error taxonomy
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod compression;
pub mod errors;
pub mod extraction;
pub mod gate;
pub mod pipeline;
pub mod providers;

// Re-export main types for easier usage
pub use app_config::Config;
pub use compression::{CompressionBudget, EncodedPayload, compress};
pub use errors::{CompressionError, TranslationError};
pub use extraction::{ExtractedPayload, TranslationOutcome};
pub use gate::{RequestGate, RequestPermit};
pub use pipeline::TranslationPipeline;
pub use providers::TranslationBackend;
