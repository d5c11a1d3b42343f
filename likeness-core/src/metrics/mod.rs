//! Metric adapters.
//!
//! Each adapter reads one or two decoded images and produces either a score
//! or a descriptor, never mutating its inputs:
//!
//! - **features**: fixed-length feature vectors and their cosine similarity
//! - **template**: single-window normalized correlation (same size only)
//! - **distance**: SSIM or inverse-MSE on grayscale (same size only)
//! - **perceptual**: 64-bit perceptual hashes and their normalized similarity

pub mod distance;
pub mod features;
pub mod hog;
pub mod perceptual;
pub mod template;
#[cfg(feature = "deep-features")]
pub mod vit;

pub use distance::DistanceMetric;
pub use features::{cosine_similarity, FeatureExtractor, FeatureModel};
pub use hog::{HogConfig, HogExtractor};
pub use perceptual::{HashAlgorithm, PerceptualHash, PerceptualHasher};
pub use template::match_template;
#[cfg(feature = "deep-features")]
pub use vit::VitExtractor;
