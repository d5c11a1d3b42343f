//! Multi-metric image comparison.
//!
//! The [`Comparator`] owns the (injected) feature extractor and the metric
//! strategy choices. A comparison either produces every dimension-independent
//! score, with the dimension-dependent pair cleanly absent for differently
//! sized inputs, or fails as a whole.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{LikenessError, Result};
use crate::metrics::{
    cosine_similarity, match_template, perceptual::phash_similarity, DistanceMetric,
    FeatureExtractor, FeatureModel, HashAlgorithm, PerceptualHasher,
};

/// Scores produced by one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Cosine similarity of the two feature vectors, roughly `[-1, 1]`.
    pub cosine_similarity: f64,
    /// Normalized correlation coefficient; absent when sizes differ.
    pub opencv_match: Option<f64>,
    /// SSIM or inverse-MSE similarity in `[0, 1]`; absent when sizes differ.
    pub distance_score: Option<f64>,
    /// `1 - hamming / bits` of the two perceptual hashes.
    pub phash_similarity: f64,
    /// Diagnostics (not serialized), e.g. why a metric was skipped.
    #[serde(skip)]
    pub notes: Vec<String>,
}

impl ComparisonResult {
    /// Whether the size-dependent metrics were computed.
    pub fn same_dimensions(&self) -> bool {
        self.opencv_match.is_some()
    }
}

/// Strategy selection for a [`Comparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Extractor behind `cosine_similarity`.
    pub feature_model: FeatureModel,
    /// Metric behind `distance_score`.
    pub distance_metric: DistanceMetric,
    /// Hash behind `phash_similarity`.
    pub hash_algorithm: HashAlgorithm,
}

impl fmt::Display for ComparatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "features={} distance={} hash={}",
            self.feature_model, self.distance_metric, self.hash_algorithm
        )
    }
}

impl ComparatorConfig {
    /// Parse the three strategy names, falling back to defaults for `None`.
    pub fn from_names(
        feature_model: Option<&str>,
        distance_metric: Option<&str>,
        hash_algorithm: Option<&str>,
    ) -> Result<Self> {
        fn parse_or_default<T: FromStr<Err = LikenessError> + Default>(
            value: Option<&str>,
        ) -> Result<T> {
            value.map(str::parse).transpose().map(Option::unwrap_or_default)
        }

        Ok(Self {
            feature_model: parse_or_default(feature_model)?,
            distance_metric: parse_or_default(distance_metric)?,
            hash_algorithm: parse_or_default(hash_algorithm)?,
        })
    }
}

/// Compares two images with four independent metrics.
#[derive(Clone)]
pub struct Comparator {
    extractor: Arc<dyn FeatureExtractor>,
    distance_metric: DistanceMetric,
    hasher: PerceptualHasher,
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("extractor", &self.extractor.name())
            .field("distance_metric", &self.distance_metric)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl Comparator {
    /// Build a comparator around an already-constructed extractor.
    ///
    /// `config.feature_model` is ignored; the extractor decides the features.
    pub fn new(extractor: Arc<dyn FeatureExtractor>, config: ComparatorConfig) -> Self {
        Self {
            extractor,
            distance_metric: config.distance_metric,
            hasher: PerceptualHasher::new(config.hash_algorithm),
        }
    }

    /// Build the configured extractor (once) and wrap it in a comparator.
    pub fn from_config(config: ComparatorConfig) -> Result<Self> {
        info!(%config, "Initialising comparator");
        let extractor = config.feature_model.build()?;
        Ok(Self::new(extractor, config))
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hasher.algorithm()
    }

    /// Load two images from disk and compare them.
    #[instrument(level = "info", skip(self, path1, path2), fields(
        image1 = %path1.as_ref().display(),
        image2 = %path2.as_ref().display(),
    ))]
    pub fn compare(
        &self,
        path1: impl AsRef<Path>,
        path2: impl AsRef<Path>,
    ) -> Result<ComparisonResult> {
        info!("Comparing images");
        let image1 = load_image(path1.as_ref())?;
        let image2 = load_image(path2.as_ref())?;
        self.compare_images(&image1, &image2)
    }

    /// Decode two in-memory images and compare them.
    pub fn compare_bytes(&self, bytes1: &[u8], bytes2: &[u8]) -> Result<ComparisonResult> {
        let image1 = decode_image(bytes1, "<image1>")?;
        let image2 = decode_image(bytes2, "<image2>")?;
        self.compare_images(&image1, &image2)
    }

    /// Compare two decoded images.
    pub fn compare_images(
        &self,
        image1: &DynamicImage,
        image2: &DynamicImage,
    ) -> Result<ComparisonResult> {
        let features1 = self.extractor.extract(image1)?;
        let features2 = self.extractor.extract(image2)?;
        let cosine = cosine_similarity(&features1, &features2)?;
        debug!(extractor = self.extractor.name(), cosine, "Feature similarity");

        let mut notes = Vec::new();
        let (opencv_match, distance_score) = if image1.dimensions() == image2.dimensions() {
            let matched = match_template(image1, image2);
            let distance = self.distance_metric.score(image1, image2)?;
            (matched, distance)
        } else {
            let (w1, h1) = image1.dimensions();
            let (w2, h2) = image2.dimensions();
            let note = format!(
                "Images have different sizes ({}x{} vs {}x{}), skipping template matching and {}",
                w1,
                h1,
                w2,
                h2,
                self.distance_metric.to_string().to_uppercase()
            );
            warn!("{}", note);
            notes.push(note);
            (None, None)
        };

        let phash = phash_similarity(&self.hasher, image1, image2)?;

        info!(
            cosine_similarity = cosine,
            opencv_match = ?opencv_match,
            distance_score = ?distance_score,
            phash_similarity = phash,
            "Comparison completed"
        );

        Ok(ComparisonResult {
            cosine_similarity: cosine,
            opencv_match,
            distance_score,
            phash_similarity: phash,
            notes,
        })
    }
}

/// Read and decode an image file, guessing the format from its contents.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)
        .map_err(|e| LikenessError::image_load(path, e))?
        .with_guessed_format()
        .map_err(|e| LikenessError::image_load(path, e))?
        .decode()
        .map_err(|e| LikenessError::image_load(path, e))?;

    debug!(path = %path.display(), width = image.width(), height = image.height(), "Loaded image");
    Ok(image)
}

/// Decode an in-memory image; `label` names it in errors.
pub fn decode_image(bytes: &[u8], label: &str) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| LikenessError::image_load(label, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn scene(width: u32, height: u32, shift: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            let r = ((x + shift) * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            let b = if ((x + shift) / 10 + y / 10) % 2 == 0 { 200 } else { 40 };
            Rgb([r, g, b])
        }))
    }

    /// Extractor returning a fixed vector, for exercising the comparator alone.
    struct ConstantExtractor(Vec<f32>);

    impl FeatureExtractor for ConstantExtractor {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn dimension(&self) -> usize {
            self.0.len()
        }

        fn extract(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl FeatureExtractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn dimension(&self) -> usize {
            4
        }

        fn extract(&self, _image: &DynamicImage) -> Result<Vec<f32>> {
            Err(LikenessError::Comparison("model exploded".into()))
        }
    }

    fn comparator() -> Comparator {
        Comparator::from_config(ComparatorConfig::default()).unwrap()
    }

    #[test]
    fn test_identical_images() {
        let img = scene(64, 64, 0);
        let result = comparator().compare_images(&img, &img).unwrap();

        assert!((result.cosine_similarity - 1.0).abs() < 1e-6);
        assert!((result.opencv_match.unwrap() - 1.0).abs() < 1e-9);
        assert!((result.distance_score.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(result.phash_similarity, 1.0);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn test_size_mismatch_skips_gated_metrics_together() {
        let result = comparator()
            .compare_images(&scene(100, 100, 0), &scene(200, 200, 0))
            .unwrap();

        assert!(result.opencv_match.is_none());
        assert!(result.distance_score.is_none());
        assert!(!result.same_dimensions());
        assert_eq!(result.notes.len(), 1);
        assert!((0.0..=1.0).contains(&result.phash_similarity));
    }

    #[test]
    fn test_injected_extractor_is_used() {
        let comparator = Comparator::new(
            Arc::new(ConstantExtractor(vec![1.0, 0.0, 0.0])),
            ComparatorConfig::default(),
        );
        let result = comparator
            .compare_images(&scene(32, 32, 0), &scene(32, 32, 7))
            .unwrap();
        assert_eq!(result.cosine_similarity, 1.0);
        assert_eq!(comparator.extractor_name(), "constant");
    }

    #[test]
    fn test_extractor_failure_fails_whole_comparison() {
        let comparator = Comparator::new(Arc::new(FailingExtractor), ComparatorConfig::default());
        let err = comparator
            .compare_images(&scene(32, 32, 0), &scene(32, 32, 0))
            .unwrap_err();
        assert!(err.to_string().contains("model exploded"));
    }

    #[test]
    fn test_distance_failure_fails_whole_comparison() {
        // 5x5 is below the SSIM window, so the distance adapter errors.
        let err = comparator()
            .compare_images(&scene(5, 5, 0), &scene(5, 5, 0))
            .unwrap_err();
        assert!(matches!(err, LikenessError::Comparison(_)));
    }

    #[test]
    fn test_inverse_mse_strategy() {
        let config = ComparatorConfig {
            distance_metric: DistanceMetric::InverseMse,
            ..ComparatorConfig::default()
        };
        let comparator = Comparator::from_config(config).unwrap();
        let img = scene(48, 48, 0);
        let shifted = scene(48, 48, 5);

        let same = comparator.compare_images(&img, &img).unwrap();
        let diff = comparator.compare_images(&img, &shifted).unwrap();
        assert_eq!(same.distance_score, Some(1.0));
        assert!(diff.distance_score.unwrap() < 1.0);
    }

    #[test]
    fn test_compare_bytes_rejects_garbage() {
        let err = comparator()
            .compare_bytes(b"not an image", b"also not")
            .unwrap_err();
        assert!(err.is_image_load());
    }

    #[test]
    fn test_config_from_names() {
        let config = ComparatorConfig::from_names(Some("hog"), Some("mse"), None).unwrap();
        assert_eq!(config.feature_model, FeatureModel::Hog);
        assert_eq!(config.distance_metric, DistanceMetric::InverseMse);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Dct64);

        assert!(ComparatorConfig::from_names(None, Some("psnr"), None).is_err());
    }

    #[test]
    fn test_result_serializes_four_fields() {
        let result = ComparisonResult {
            cosine_similarity: 0.5,
            opencv_match: None,
            distance_score: None,
            phash_similarity: 0.75,
            notes: vec!["skipped".into()],
        };
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(obj["opencv_match"].is_null());
        assert!(obj["distance_score"].is_null());
        assert_eq!(obj["phash_similarity"], 0.75);
    }
}
