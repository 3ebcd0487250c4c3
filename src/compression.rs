/*!
 * Two-pass image compression for the translation pipeline.
 *
 * Screenshots arrive at arbitrary sizes; the remote endpoint wants a small
 * JPEG. This module bounds the encoded size with a prescale pass, a binary
 * search over the encoder quality, and a progressive downscale fallback.
 */

use std::io::Cursor;

use anyhow::{Result, anyhow};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::CompressionError;

/// MIME type of every payload this module produces.
pub const JPEG_MIME: &str = "image/jpeg";

/// Absolute floor for the longer side during the downscale fallback.
const MIN_FALLBACK_DIMENSION: u32 = 64;

/// Byte budget and quality bounds for [`compress`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompressionBudget {
    /// Preferred encoded size in bytes; overshoot above this is accepted
    /// while under `max_bytes` to maximize visual quality
    #[serde(default = "default_target_bytes")]
    pub target_bytes: u64,

    /// Hard ceiling on the encoded size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Lowest JPEG quality the search may use
    #[serde(default = "default_quality_min")]
    pub quality_min: u8,

    /// Highest JPEG quality the search may use
    #[serde(default = "default_quality_max")]
    pub quality_max: u8,

    /// Longer image side is prescaled down to this before the quality search
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_target_bytes() -> u64 {
    600 * 1024
}

fn default_max_bytes() -> u64 {
    1024 * 1024
}

fn default_quality_min() -> u8 {
    40
}

fn default_quality_max() -> u8 {
    95
}

fn default_max_dimension() -> u32 {
    1920
}

impl Default for CompressionBudget {
    fn default() -> Self {
        Self {
            target_bytes: default_target_bytes(),
            max_bytes: default_max_bytes(),
            quality_min: default_quality_min(),
            quality_max: default_quality_max(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl CompressionBudget {
    /// Validate the budget invariants.
    pub fn validate(&self) -> Result<()> {
        if self.target_bytes == 0 || self.target_bytes > self.max_bytes {
            return Err(anyhow!(
                "Compression budget requires 0 < target_bytes <= max_bytes, got target {} and max {}",
                self.target_bytes,
                self.max_bytes
            ));
        }
        if self.quality_min == 0 || self.quality_min > self.quality_max || self.quality_max > 100 {
            return Err(anyhow!(
                "Compression budget requires 0 < quality_min <= quality_max <= 100, got {}..{}",
                self.quality_min,
                self.quality_max
            ));
        }
        if self.max_dimension == 0 {
            return Err(anyhow!("Compression budget requires a non-zero max_dimension"));
        }
        Ok(())
    }
}

/// A size-bounded encoded image ready for transmission.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Encoded bytes
    pub bytes: Vec<u8>,

    /// MIME type of the encoding
    pub mime_type: &'static str,

    /// Width of the encoded frame in pixels
    pub width: u32,

    /// Height of the encoded frame in pixels
    pub height: u32,
}

impl EncodedPayload {
    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One encoding produced during the search, with the frame size it came from.
struct Candidate {
    bytes: Vec<u8>,
    quality: u8,
    width: u32,
    height: u32,
}

impl Candidate {
    fn into_payload(self) -> EncodedPayload {
        EncodedPayload {
            bytes: self.bytes,
            mime_type: JPEG_MIME,
            width: self.width,
            height: self.height,
        }
    }
}

/// Result of one quality search at a fixed frame size.
enum QualitySearch {
    /// Best encoding that fits under `max_bytes`
    Fit(Candidate),
    /// Nothing in the quality range fit; carries the smallest encoding seen
    Oversize(Candidate),
}

/// Compress an image into the given byte budget.
///
/// Deterministic for a given input and budget. The compressor never fails on
/// oversize output: if even the lowest quality at the smallest allowed scale
/// exceeds `max_bytes`, the smallest encoding obtained is returned and the
/// transport layer's error classification deals with the consequences. Only a
/// degenerate zero-pixel input is an error.
pub fn compress(image: &DynamicImage, budget: &CompressionBudget) -> Result<EncodedPayload, CompressionError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(CompressionError::EmptyImage { width, height });
    }

    // Prescale pass: bound the longer side before searching.
    let prescaled;
    let working: &DynamicImage = if width.max(height) > budget.max_dimension {
        let (new_width, new_height) = scaled_dimensions(width, height, budget.max_dimension);
        debug!("Prescaling {}x{} to {}x{}", width, height, new_width, new_height);
        prescaled = image.resize_exact(new_width, new_height, FilterType::Lanczos3);
        &prescaled
    } else {
        image
    };

    let mut smallest = match quality_search(working, budget)? {
        QualitySearch::Fit(candidate) => {
            debug!(
                "Quality search settled on q={} at {} bytes",
                candidate.quality,
                candidate.bytes.len()
            );
            return Ok(candidate.into_payload());
        }
        QualitySearch::Oversize(candidate) => candidate,
    };

    // Progressive downscale fallback: even the lowest quality was oversize.
    let (base_width, base_height) = (working.width(), working.height());
    let mut factor = 0.9_f64;
    while factor >= 0.3 - f64::EPSILON {
        let new_width = ((base_width as f64 * factor).round() as u32).max(1);
        let new_height = ((base_height as f64 * factor).round() as u32).max(1);
        if new_width.max(new_height) < MIN_FALLBACK_DIMENSION {
            break;
        }

        let scaled = working.resize_exact(new_width, new_height, FilterType::Lanczos3);
        match quality_search(&scaled, budget)? {
            QualitySearch::Fit(candidate) => {
                debug!(
                    "Downscale fallback fit at {}x{} q={} ({} bytes)",
                    new_width,
                    new_height,
                    candidate.quality,
                    candidate.bytes.len()
                );
                return Ok(candidate.into_payload());
            }
            QualitySearch::Oversize(candidate) => {
                if candidate.bytes.len() < smallest.bytes.len() {
                    smallest = candidate;
                }
            }
        }

        factor -= 0.1;
    }

    debug!(
        "Budget of {} bytes unreachable, returning smallest encoding ({} bytes at {}x{})",
        budget.max_bytes,
        smallest.bytes.len(),
        smallest.width,
        smallest.height
    );
    Ok(smallest.into_payload())
}

/// Binary-search the JPEG quality range for the largest quality whose encoded
/// size fits under `max_bytes`.
///
/// A candidate that also lands at or above `target_bytes` wins immediately:
/// slight overshoot above target is accepted while under max. The smallest
/// encoding seen is always tracked for the caller's oversize fallback.
fn quality_search(image: &DynamicImage, budget: &CompressionBudget) -> Result<QualitySearch, CompressionError> {
    let (width, height) = (image.width(), image.height());
    let max_bytes = budget.max_bytes as usize;
    let target_bytes = budget.target_bytes as usize;

    // Already-tiny shortcut, and the common case: the highest quality in
    // range fits under max, so it is the answer by construction.
    let at_max = encode_jpeg(image, budget.quality_max)?;
    if at_max.len() <= max_bytes {
        return Ok(QualitySearch::Fit(Candidate {
            bytes: at_max,
            quality: budget.quality_max,
            width,
            height,
        }));
    }

    let mut smallest = Candidate {
        bytes: at_max,
        quality: budget.quality_max,
        width,
        height,
    };
    let mut best_fit: Option<Candidate> = None;
    let mut lo = budget.quality_min as i32;
    let mut hi = budget.quality_max as i32 - 1;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let encoded = encode_jpeg(image, mid as u8)?;

        if encoded.len() < smallest.bytes.len() {
            smallest = Candidate {
                bytes: encoded.clone(),
                quality: mid as u8,
                width,
                height,
            };
        }

        if encoded.len() <= max_bytes {
            let candidate = Candidate {
                bytes: encoded,
                quality: mid as u8,
                width,
                height,
            };
            if candidate.bytes.len() >= target_bytes {
                return Ok(QualitySearch::Fit(candidate));
            }
            best_fit = Some(candidate);
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    Ok(match best_fit {
        Some(candidate) => QualitySearch::Fit(candidate),
        None => QualitySearch::Oversize(smallest),
    })
}

/// Encode an image as JPEG at the given quality.
///
/// The frame is flattened to RGB first; the JPEG encoder has no alpha channel.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressionError> {
    let rgb = image.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| CompressionError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Scale `(width, height)` uniformly so the longer side equals `max_dimension`.
fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width >= height {
        let scaled = ((height as u64 * max_dimension as u64) / width as u64).max(1) as u32;
        (max_dimension, scaled)
    } else {
        let scaled = ((width as u64 * max_dimension as u64) / height as u64).max(1) as u32;
        (scaled, max_dimension)
    }
}
