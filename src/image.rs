//! Image-to-text collaborator. The vision internals are external to this
//! crate; what lives here is the contract (data-URL validation, the outcome
//! shape) and a deterministic stub used for local/dev runs.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{CuriousMindError, Result};
use crate::types::{ImageMethod, ImageOutcome};

/// Minimum plausible length for an encoded image payload.
const MIN_IMAGE_DATA_LEN: usize = 100;

static IMAGE_DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/(jpeg|jpg|png|gif|webp);base64,").unwrap());

/// Reject payloads that are not a base64 data URL for a supported image type.
pub fn validate_image_payload(image_data: &str) -> Result<()> {
    if !IMAGE_DATA_URL.is_match(image_data) || image_data.len() <= MIN_IMAGE_DATA_LEN {
        return Err(CuriousMindError::ImageFormat {
            message: "expected a base64 data URL for a jpeg, png, gif, or webp image".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Turn an encoded image into text usable as question input: extracted
    /// text when the image contains enough of it, a scene description
    /// otherwise. Malformed payloads fail fast with an image-format error.
    async fn process_image(&self, image_data: &str) -> Result<ImageOutcome>;
}

/// Deterministic, local analyzer (no vision backend). Picks from fixed text
/// and description pools keyed by a hash of the payload, so the same image
/// always yields the same outcome.
pub struct StubAnalyzer;

const STUB_TEXTS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog",
    "Welcome to our restaurant - Today's special: Fish and Chips",
    "Speed limit 25 mph",
    "No parking between 8am-6pm",
    "Fresh organic vegetables for sale",
    "Meeting room A - Conference at 2pm",
];

const STUB_DESCRIPTIONS: &[&str] = &[
    "A beautiful sunset over a mountain landscape with orange and pink clouds",
    "A busy city street with cars, pedestrians, and tall buildings",
    "A close-up photo of a cat sitting on a windowsill looking outside",
    "A plate of delicious food with colorful vegetables and garnishes",
    "A group of friends laughing and having fun at a party",
    "A peaceful forest scene with tall trees and dappled sunlight",
    "A modern office space with computers, desks, and office supplies",
    "A child playing with toys in a bright, colorful playroom",
];

fn payload_hash(image_data: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    image_data.hash(&mut hasher);
    hasher.finish()
}

#[async_trait]
impl ImageAnalyzer for StubAnalyzer {
    async fn process_image(&self, image_data: &str) -> Result<ImageOutcome> {
        validate_image_payload(image_data)?;

        let hash = payload_hash(image_data);

        // Even hashes simulate a text-bearing image, odd ones a scene.
        if hash % 2 == 0 {
            let text = STUB_TEXTS[(hash / 2) as usize % STUB_TEXTS.len()];
            debug_assert!(text.len() > 10);
            Ok(ImageOutcome {
                extracted_text: Some(text.to_string()),
                description: format!("Image contains text: \"{}\"", text),
                confidence_score: 85,
                method: ImageMethod::TextExtraction,
                processed_at: Utc::now(),
            })
        } else {
            let description = STUB_DESCRIPTIONS[(hash / 2) as usize % STUB_DESCRIPTIONS.len()];
            Ok(ImageOutcome {
                extracted_text: None,
                description: description.to_string(),
                confidence_score: 80,
                method: ImageMethod::ImageDescription,
                processed_at: Utc::now(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> String {
        format!("data:image/png;base64,{}", "A".repeat(200))
    }

    #[test]
    fn payload_validation_requires_data_url() {
        assert!(validate_image_payload("not an image").is_err());
        assert!(validate_image_payload("data:text/plain;base64,aGVsbG8=").is_err());
        // Right prefix but implausibly short
        assert!(validate_image_payload("data:image/png;base64,AAAA").is_err());
        assert!(validate_image_payload(&valid_payload()).is_ok());
    }

    #[tokio::test]
    async fn stub_analyzer_is_deterministic() {
        let analyzer = StubAnalyzer;
        let payload = valid_payload();
        let first = analyzer.process_image(&payload).await.unwrap();
        let second = analyzer.process_image(&payload).await.unwrap();
        assert_eq!(first.method, second.method);
        assert_eq!(first.question_input(), second.question_input());
    }

    #[tokio::test]
    async fn stub_analyzer_rejects_malformed_payloads() {
        let analyzer = StubAnalyzer;
        let err = analyzer.process_image("nonsense").await.unwrap_err();
        assert!(matches!(err, CuriousMindError::ImageFormat { .. }));
    }
}
