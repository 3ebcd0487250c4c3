/*!
 * Tests for the two-pass image compressor
 */

use screentrans::compression::{CompressionBudget, compress, encode_jpeg};
use screentrans::errors::CompressionError;

use crate::common::{flat_image, gradient_image, noise_image};

fn budget(target_kib: u64, max_kib: u64) -> CompressionBudget {
    CompressionBudget {
        target_bytes: target_kib * 1024,
        max_bytes: max_kib * 1024,
        ..CompressionBudget::default()
    }
}

#[test]
fn test_budget_default_shouldValidate() {
    assert!(CompressionBudget::default().validate().is_ok());
}

#[test]
fn test_budget_targetAboveMax_shouldFailValidation() {
    let budget = CompressionBudget {
        target_bytes: 2048,
        max_bytes: 1024,
        ..CompressionBudget::default()
    };
    assert!(budget.validate().is_err());
}

#[test]
fn test_budget_zeroTarget_shouldFailValidation() {
    let budget = CompressionBudget {
        target_bytes: 0,
        ..CompressionBudget::default()
    };
    assert!(budget.validate().is_err());
}

#[test]
fn test_budget_invertedQualityRange_shouldFailValidation() {
    let budget = CompressionBudget {
        quality_min: 90,
        quality_max: 40,
        ..CompressionBudget::default()
    };
    assert!(budget.validate().is_err());
}

#[test]
fn test_budget_qualityAboveHundred_shouldFailValidation() {
    let budget = CompressionBudget {
        quality_max: 101,
        ..CompressionBudget::default()
    };
    assert!(budget.validate().is_err());
}

#[test]
fn test_compress_zeroDimension_shouldFailFast() {
    let image = image::DynamicImage::new_rgb8(0, 10);
    let result = compress(&image, &CompressionBudget::default());
    assert!(matches!(result, Err(CompressionError::EmptyImage { .. })));
}

#[test]
fn test_compress_largeImage_shouldPrescaleLongerSideToMaxDimension() {
    let image = gradient_image(3000, 2000);
    let payload = compress(&image, &CompressionBudget::default()).unwrap();
    assert_eq!(payload.width, 1920);
    assert_eq!(payload.height, 1280);
}

#[test]
fn test_compress_smallImage_shouldNotScale() {
    let image = gradient_image(640, 480);
    let payload = compress(&image, &CompressionBudget::default()).unwrap();
    assert_eq!(payload.width, 640);
    assert_eq!(payload.height, 480);
}

#[test]
fn test_compress_shouldFitUnderMaxBytes() {
    let image = noise_image(1024, 768);
    let budget = budget(60, 120);
    let payload = compress(&image, &budget).unwrap();
    assert!(payload.len() as u64 <= budget.max_bytes);
    assert_eq!(payload.mime_type, "image/jpeg");
}

#[test]
fn test_compress_tinyFlatImage_shouldUseMaxQualityWithoutSearch() {
    let image = flat_image(64, 64);
    let budget = CompressionBudget::default();
    let payload = compress(&image, &budget).unwrap();
    // A flat 64x64 frame is far under target even at max quality.
    let at_max = encode_jpeg(&image, budget.quality_max).unwrap();
    assert_eq!(payload.bytes, at_max);
}

#[test]
fn test_compress_unreachableBudget_shouldReturnSmallestNotError() {
    // 1 KiB is unreachable for noise even after the downscale floor.
    let image = noise_image(1024, 1024);
    let impossible = CompressionBudget {
        target_bytes: 512,
        max_bytes: 1024,
        ..CompressionBudget::default()
    };
    let payload = compress(&image, &impossible).unwrap();
    assert!(!payload.is_empty());
    // Fallback shrank the frame toward the floor.
    assert!(payload.width < 1024);
}

#[test]
fn test_encodeJpeg_monotonicInQuality() {
    let image = noise_image(512, 512);
    let high = encode_jpeg(&image, 90).unwrap();
    let low = encode_jpeg(&image, 25).unwrap();
    assert!(high.len() >= low.len());
}

#[test]
fn test_compress_roundTrip_shouldPreserveDimensions() {
    let image = gradient_image(800, 600);
    let payload = compress(&image, &CompressionBudget::default()).unwrap();
    let decoded = image::load_from_memory(&payload.bytes).unwrap();
    assert_eq!(decoded.width(), payload.width);
    assert_eq!(decoded.height(), payload.height);
    assert_eq!(decoded.width(), 800);
    assert_eq!(decoded.height(), 600);
}

#[test]
fn test_compress_deterministic_forSameInputAndBudget() {
    let image = noise_image(400, 300);
    let budget = budget(40, 80);
    let first = compress(&image, &budget).unwrap();
    let second = compress(&image, &budget).unwrap();
    assert_eq!(first.bytes, second.bytes);
}
