/*!
 * Tests for response extraction: field aliasing, shape classification, and
 * structured-text parsing
 */

use screentrans::errors::TranslationError;
use screentrans::extraction::{ExtractedPayload, classify, extract_outcome};
use screentrans::providers::gemini::GenerateContentResponse;

use crate::common::mock_backends::{image_response, text_response};
use crate::common::tiny_png_base64;

fn response_from_json(json: &str) -> GenerateContentResponse {
    serde_json::from_str(json).expect("test response JSON should deserialize")
}

#[test]
fn test_extract_inlineDataSnakeCase_shouldYieldImage() {
    let json = format!(
        r#"{{"candidates":[{{"content":{{"parts":[{{"inline_data":{{"mime_type":"image/png","data":"{}"}}}}]}}}}]}}"#,
        tiny_png_base64()
    );
    let outcome = extract_outcome(&response_from_json(&json), true).unwrap();
    assert!(outcome.edited_image.is_some());
}

#[test]
fn test_extract_inlineDataCamelCase_shouldYieldIdenticalImage() {
    let data = tiny_png_base64();
    let snake = format!(
        r#"{{"candidates":[{{"content":{{"parts":[{{"inline_data":{{"mime_type":"image/png","data":"{data}"}}}}]}}}}]}}"#
    );
    let camel = format!(
        r#"{{"candidates":[{{"content":{{"parts":[{{"inlineData":{{"mimeType":"image/png","data":"{data}"}}}}]}}}}]}}"#
    );

    let from_snake = extract_outcome(&response_from_json(&snake), true).unwrap();
    let from_camel = extract_outcome(&response_from_json(&camel), true).unwrap();

    let a = from_snake.edited_image.unwrap().into_rgb8();
    let b = from_camel.edited_image.unwrap().into_rgb8();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn test_extract_imageWithCommentary_shouldCarryAuxiliaryText() {
    let response = image_response(tiny_png_base64(), Some("replaced two captions"));
    let outcome = extract_outcome(&response, true).unwrap();
    assert!(outcome.edited_image.is_some());
    assert_eq!(outcome.auxiliary_text.as_deref(), Some("replaced two captions"));
}

#[test]
fn test_extract_textOnlyWhenImageExpected_shouldBeInvalidResponse() {
    let response = text_response(r#"{"source_text":"hola","translated_text":"hello","confidence":0.9}"#);
    let result = extract_outcome(&response, true);
    assert!(matches!(result, Err(TranslationError::InvalidResponse(_))));
}

#[test]
fn test_extract_structuredText_shouldParseScalarFields() {
    let response = text_response(r#"{"source_text":"hola","transliteration":null,"translated_text":"hello","confidence":0.9}"#);
    let outcome = extract_outcome(&response, false).unwrap();
    assert_eq!(outcome.source_text.as_deref(), Some("hola"));
    assert_eq!(outcome.translated_text.as_deref(), Some("hello"));
    assert!((outcome.confidence - 0.9).abs() < 1e-6);
    assert!(outcome.edited_image.is_none());
}

#[test]
fn test_extract_structuredTextCamelCaseFields_shouldAlias() {
    let response = text_response(r#"{"sourceText":"hola","translatedText":"hello","confidence":0.5}"#);
    let outcome = extract_outcome(&response, false).unwrap();
    assert_eq!(outcome.source_text.as_deref(), Some("hola"));
    assert_eq!(outcome.translated_text.as_deref(), Some("hello"));
}

#[test]
fn test_extract_fencedJson_shouldUnwrapAndParse() {
    let response = text_response("```json\n{\"translated_text\":\"hello\",\"confidence\":1.2}\n```");
    let outcome = extract_outcome(&response, false).unwrap();
    assert_eq!(outcome.translated_text.as_deref(), Some("hello"));
    // Out-of-range confidence is clamped.
    assert_eq!(outcome.confidence, 1.0);
}

#[test]
fn test_extract_jsonBuriedInProse_shouldLocateByBraceMatching() {
    let response = text_response("Here is the translation you asked for: {\"translated_text\":\"hi\"} enjoy!");
    let outcome = extract_outcome(&response, false).unwrap();
    assert_eq!(outcome.translated_text.as_deref(), Some("hi"));
}

#[test]
fn test_extract_textWithoutJson_shouldBeInvalidResponse() {
    let response = text_response("I could not process this image, sorry.");
    let result = extract_outcome(&response, false);
    assert!(matches!(result, Err(TranslationError::InvalidResponse(_))));
}

#[test]
fn test_extract_malformedBase64_shouldBeInvalidResponseWithDistinctDetail() {
    let response = image_response("not-valid-base64!!!", None);
    match extract_outcome(&response, true) {
        Err(TranslationError::InvalidResponse(detail)) => assert!(detail.contains("base64")),
        other => panic!("expected InvalidResponse, got {:?}", other),
    }
}

#[test]
fn test_extract_undecodableImageBytes_shouldBeInvalidResponse() {
    use base64::Engine;
    let garbage = base64::engine::general_purpose::STANDARD.encode(b"definitely not an image");
    let response = image_response(garbage, None);
    match extract_outcome(&response, true) {
        Err(TranslationError::InvalidResponse(detail)) => assert!(detail.contains("decoded")),
        other => panic!("expected InvalidResponse, got {:?}", other),
    }
}

#[test]
fn test_extract_noCandidates_shouldBeInvalidResponse() {
    let response = response_from_json(r#"{"candidates":[]}"#);
    assert!(matches!(
        extract_outcome(&response, true),
        Err(TranslationError::InvalidResponse(_))
    ));
}

#[test]
fn test_classify_imageResponse_shouldBeImageEditVariant() {
    let response = image_response(tiny_png_base64(), Some("note"));
    match classify(&response).unwrap() {
        ExtractedPayload::ImageEdit { commentary, .. } => {
            assert_eq!(commentary.as_deref(), Some("note"));
        }
        other => panic!("expected ImageEdit, got {:?}", other),
    }
}

#[test]
fn test_classify_textResponse_shouldBeTextOnlyVariant() {
    let response = text_response(r#"{"translated_text":"hey"}"#);
    match classify(&response).unwrap() {
        ExtractedPayload::TextOnly(structured) => {
            assert_eq!(structured.translated_text.as_deref(), Some("hey"));
        }
        other => panic!("expected TextOnly, got {:?}", other),
    }
}
