//! Feature-vector adapters feeding the cosine-similarity score.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{LikenessError, Result};

/// Turns an image into a fixed-length feature vector.
///
/// Implementations are constructed once and shared read-only across
/// comparisons (and request handlers), so they must be `Send + Sync`.
pub trait FeatureExtractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Length of every vector returned by [`FeatureExtractor::extract`].
    fn dimension(&self) -> usize;

    /// Extract a flattened feature vector. Must not depend on input size.
    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>>;
}

/// Which extractor fills the cosine-similarity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureModel {
    /// Histogram of oriented gradients, computed locally.
    #[default]
    Hog,
    /// Pretrained ViT-B/16 CLS embedding (requires the `deep-features` feature).
    Vit,
}

impl FeatureModel {
    /// Construct the extractor for this model.
    ///
    /// Loading a pretrained network may download weights; call this once at
    /// startup and share the result.
    pub fn build(self) -> Result<Arc<dyn FeatureExtractor>> {
        match self {
            Self::Hog => Ok(Arc::new(super::hog::HogExtractor::default())),
            #[cfg(feature = "deep-features")]
            Self::Vit => Ok(Arc::new(super::vit::VitExtractor::load()?)),
            #[cfg(not(feature = "deep-features"))]
            Self::Vit => Err(LikenessError::Configuration(
                "The 'vit' feature model requires building with the `deep-features` feature"
                    .into(),
            )),
        }
    }
}

impl fmt::Display for FeatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hog => f.write_str("hog"),
            Self::Vit => f.write_str("vit"),
        }
    }
}

impl FromStr for FeatureModel {
    type Err = LikenessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hog" => Ok(Self::Hog),
            "vit" | "deep" => Ok(Self::Vit),
            other => Err(LikenessError::Configuration(format!(
                "Unknown feature model '{}' (expected hog or vit)",
                other
            ))),
        }
    }
}

/// Cosine of the angle between two feature vectors.
///
/// Vectors must be non-empty and of equal length. Two zero vectors are
/// identical and score 1.0; a zero vector against a non-zero one scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(LikenessError::Comparison(
            "Cannot compute cosine similarity of empty feature vectors".into(),
        ));
    }
    if a.len() != b.len() {
        return Err(LikenessError::Comparison(format!(
            "Feature vector length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 && norm_b == 0.0 {
        return Ok(1.0);
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / denom).clamp(-1.0, 1.0))
}
