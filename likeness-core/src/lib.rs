//! Likeness Core - multi-metric image similarity scoring
//!
//! Compares two images with four independent metrics and returns them as a
//! single [`ComparisonResult`]:
//!
//! - Cosine similarity of feature vectors (HOG, or a pretrained ViT with the
//!   `deep-features` feature)
//! - Template-match correlation coefficient (same-sized images only)
//! - SSIM or inverse-MSE pixel similarity (same-sized images only)
//! - Perceptual hash similarity
//!
//! # Example
//!
//! ```no_run
//! use likeness_core::{Comparator, ComparatorConfig};
//!
//! # fn example() -> likeness_core::Result<()> {
//! let comparator = Comparator::from_config(ComparatorConfig::default())?;
//! let result = comparator.compare("a.png", "b.png")?;
//!
//! println!("pHash similarity: {:.2}%", result.phash_similarity * 100.0);
//! if let Some(score) = result.opencv_match {
//!     println!("Template match: {score:.4}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod comparator;
pub mod error;
#[cfg(feature = "network")]
pub mod generation;
pub mod metrics;

pub use comparator::{decode_image, load_image, Comparator, ComparatorConfig, ComparisonResult};
pub use error::{LikenessError, Result};
pub use metrics::{
    cosine_similarity, match_template, DistanceMetric, FeatureExtractor, FeatureModel,
    HashAlgorithm, HogExtractor, PerceptualHash, PerceptualHasher,
};

#[cfg(feature = "network")]
pub use generation::{
    GenerationConfig, HuggingFaceGenerator, ImageGenerator, MockGenerator, DEFAULT_API_URL,
};
