/*!
 * Response extraction for the translation pipeline.
 *
 * The endpoint answers in one of two shapes: a single text part carrying a
 * JSON-encoded structured translation (possibly inside a markdown code
 * fence), or a list of parts where one carries inline image data and another
 * optional free text. This module classifies the shape explicitly and
 * normalizes both into a [`TranslationOutcome`].
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use regex::Regex;
use serde::Deserialize;

use crate::errors::TranslationError;
use crate::providers::gemini::{GenerateContentResponse, Part};

/// Normalized result of a translation call.
#[derive(Debug, Clone, Default)]
pub struct TranslationOutcome {
    /// Text recognized in the source language, if the endpoint reported it
    pub source_text: Option<String>,

    /// Transliteration of the source text
    pub transliteration: Option<String>,

    /// Translated text
    pub translated_text: Option<String>,

    /// Confidence score in `[0, 1]`
    pub confidence: f32,

    /// Edited image with the translation rendered in place
    pub edited_image: Option<DynamicImage>,

    /// Raw auxiliary text the endpoint returned alongside an edited image
    pub auxiliary_text: Option<String>,
}

/// Response payload after shape classification.
#[derive(Debug, Clone)]
pub enum ExtractedPayload {
    /// A structured translation with no edited image
    TextOnly(StructuredTranslation),

    /// An edited image, with optional free-text commentary
    ImageEdit {
        /// The decoded edited image
        image: DynamicImage,
        /// Free text returned next to the image part
        commentary: Option<String>,
    },
}

/// The four scalar fields of a structured text translation.
///
/// Field names drifted between snake and camel case across endpoint
/// revisions; aliases accept both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredTranslation {
    /// Recognized source-language text
    #[serde(default, alias = "sourceText")]
    pub source_text: Option<String>,

    /// Transliteration of the source text
    #[serde(default)]
    pub transliteration: Option<String>,

    /// Translated text
    #[serde(default, alias = "translatedText", alias = "translation")]
    pub translated_text: Option<String>,

    /// Confidence score; clamped to `[0, 1]` during extraction
    #[serde(default)]
    pub confidence: f32,
}

/// Classify a response body into its payload shape.
///
/// Scans all parts of the first candidate: the first part exposing inline
/// data (under either field-name convention) supplies the edited image, the
/// first text part supplies commentary or the structured translation.
pub fn classify(response: &GenerateContentResponse) -> Result<ExtractedPayload, TranslationError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| TranslationError::InvalidResponse("response contained no candidates".to_string()))?;

    let mut image: Option<DynamicImage> = None;
    let mut text: Option<String> = None;

    for part in &candidate.content.parts {
        match part {
            Part::InlineData { inline_data } if image.is_none() => {
                let bytes = STANDARD.decode(&inline_data.data).map_err(|e| {
                    TranslationError::InvalidResponse(format!("inline image data is not valid base64: {e}"))
                })?;
                let decoded = image::load_from_memory(&bytes).map_err(|e| {
                    TranslationError::InvalidResponse(format!("inline image bytes could not be decoded: {e}"))
                })?;
                image = Some(decoded);
            }
            Part::Text { text: part_text } if text.is_none() => {
                text = Some(part_text.clone());
            }
            _ => {}
        }
    }

    if let Some(image) = image {
        return Ok(ExtractedPayload::ImageEdit { image, commentary: text });
    }

    let text = text.ok_or_else(|| {
        TranslationError::InvalidResponse("response contained no image part and no text part".to_string())
    })?;
    Ok(ExtractedPayload::TextOnly(parse_structured_translation(&text)?))
}

/// Extract a normalized outcome from a response body.
///
/// When `expect_image` is set, a text-only payload is an error: a text reply
/// is never treated as silent success when an edited image was the object of
/// the call.
pub fn extract_outcome(
    response: &GenerateContentResponse,
    expect_image: bool,
) -> Result<TranslationOutcome, TranslationError> {
    match classify(response)? {
        ExtractedPayload::ImageEdit { image, commentary } => Ok(TranslationOutcome {
            edited_image: Some(image),
            auxiliary_text: commentary,
            confidence: 1.0,
            ..Default::default()
        }),
        ExtractedPayload::TextOnly(_) if expect_image => Err(TranslationError::InvalidResponse(
            "endpoint returned text only but an edited image was required".to_string(),
        )),
        ExtractedPayload::TextOnly(structured) => Ok(TranslationOutcome {
            source_text: structured.source_text,
            transliteration: structured.transliteration,
            translated_text: structured.translated_text,
            confidence: structured.confidence.clamp(0.0, 1.0),
            edited_image: None,
            auxiliary_text: None,
        }),
    }
}

/// Parse a text part into a structured translation.
///
/// Strips a markdown code fence if one wraps the text, then locates the
/// first well-formed JSON object by brace matching rather than assuming the
/// whole string is JSON.
fn parse_structured_translation(text: &str) -> Result<StructuredTranslation, TranslationError> {
    let unfenced = strip_code_fence(text);
    let json = locate_json_object(&unfenced).ok_or_else(|| {
        TranslationError::InvalidResponse("text response contained no JSON object".to_string())
    })?;
    serde_json::from_str(json)
        .map_err(|e| TranslationError::InvalidResponse(format!("failed to parse structured translation: {e}")))
}

/// Remove a markdown code fence wrapping the text, if present.
fn strip_code_fence(text: &str) -> String {
    let code_block_regex = Regex::new(r"```(?:json|text)?\s*\n?([\s\S]*?)\n?\s*```").unwrap_or_else(|_| {
        // Fallback to a simpler pattern if the main one fails to compile
        Regex::new(r"```([\s\S]*?)```").unwrap()
    });

    if let Some(caps) = code_block_regex.captures(text) {
        if let Some(content) = caps.get(1) {
            return content.as_str().trim().to_string();
        }
    }
    text.trim().to_string()
}

/// Locate the first balanced JSON object in the text by brace matching.
///
/// String literals and escapes are respected so braces inside values do not
/// confuse the depth count.
fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
