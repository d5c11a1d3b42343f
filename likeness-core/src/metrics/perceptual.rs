//! Perceptual hashing for images.
//!
//! A perceptual hash is a short fingerprint of an image's low-frequency
//! structure. Two hashes are compared by Hamming distance, and the comparator
//! reports `1 - distance / bits` as the pHash similarity.
//!
//! # Algorithm
//!
//! The default is a DCT-based pHash producing 64 bits (8 bytes): each bit
//! records whether a low-frequency coefficient lies above the median. Mean,
//! gradient and block-mean hashes of the same size are available for callers
//! that want a cheaper or differently-robust fingerprint.
//!
//! # Usage
//!
//! ```no_run
//! use likeness_core::metrics::perceptual::{phash_similarity, HashAlgorithm, PerceptualHasher};
//!
//! let a = image::open("image.jpg").unwrap();
//! let b = image::open("image2.jpg").unwrap();
//! let hasher = PerceptualHasher::new(HashAlgorithm::Dct64);
//! let similarity = phash_similarity(&hasher, &a, &b).unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{LikenessError, Result};

/// Fixed hash size in bytes (64 bits = 8 bytes).
pub const PERCEPTUAL_HASH_SIZE: usize = 8;

/// Hash grid side; `HASH_GRID * HASH_GRID` bits per hash.
const HASH_GRID: u32 = 8;

/// Perceptual hash algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// DCT-based pHash, 64 bits.
    #[default]
    Dct64,
    /// Mean (average) hash, 64 bits.
    Mean64,
    /// Horizontal gradient (difference) hash, 64 bits.
    Gradient64,
    /// Block-mean hash, 64 bits.
    Blockhash64,
}

impl HashAlgorithm {
    fn hasher_config(self) -> HasherConfig {
        let config = HasherConfig::new().hash_size(HASH_GRID, HASH_GRID);
        match self {
            Self::Dct64 => config.hash_alg(HashAlg::Median).preproc_dct(),
            Self::Mean64 => config.hash_alg(HashAlg::Mean),
            Self::Gradient64 => config.hash_alg(HashAlg::Gradient),
            Self::Blockhash64 => config.hash_alg(HashAlg::Blockhash),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dct64 => "dct",
            Self::Mean64 => "mean",
            Self::Gradient64 => "gradient",
            Self::Blockhash64 => "blockhash",
        };
        f.write_str(name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = LikenessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dct" | "dct64" | "phash" => Ok(Self::Dct64),
            "mean" | "mean64" | "ahash" => Ok(Self::Mean64),
            "gradient" | "gradient64" | "dhash" => Ok(Self::Gradient64),
            "blockhash" | "blockhash64" => Ok(Self::Blockhash64),
            other => Err(LikenessError::Configuration(format!(
                "Unknown hash algorithm '{}' (expected dct, mean, gradient or blockhash)",
                other
            ))),
        }
    }
}

/// Computed perceptual hash with metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHash {
    /// The hash bytes (8 bytes for every built-in algorithm)
    pub hash: Vec<u8>,
    /// Algorithm used to compute the hash
    pub algorithm: HashAlgorithm,
    /// Hash size in bits
    pub bit_size: u32,
}

impl PerceptualHash {
    /// Create from raw hash bytes.
    pub fn from_bytes(hash: Vec<u8>, algorithm: HashAlgorithm) -> Self {
        let bit_size = (hash.len() * 8) as u32;
        Self {
            hash,
            algorithm,
            bit_size,
        }
    }

    /// Compute the Hamming distance between two perceptual hashes.
    ///
    /// Hashes of different algorithms are not comparable.
    pub fn hamming_distance(&self, other: &Self) -> Result<u32> {
        if self.algorithm != other.algorithm {
            return Err(LikenessError::Comparison(format!(
                "Cannot compare {} hash with {} hash",
                self.algorithm, other.algorithm
            )));
        }

        hamming_distance(&self.hash, &other.hash).ok_or_else(|| {
            LikenessError::Comparison(format!(
                "Cannot compare perceptual hashes of {} and {} bytes",
                self.hash.len(),
                other.hash.len()
            ))
        })
    }

    /// Normalized similarity: `1 - hamming / bits`, in `[0, 1]`.
    pub fn similarity(&self, other: &Self) -> Result<f64> {
        let distance = self.hamming_distance(other)?;
        Ok(1.0 - f64::from(distance) / f64::from(self.bit_size))
    }
}

/// Perceptual hasher configuration and computation.
#[derive(Debug, Clone, Default)]
pub struct PerceptualHasher {
    algorithm: HashAlgorithm,
}

impl PerceptualHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Compute perceptual hash from a DynamicImage.
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualHash> {
        let hasher = self.algorithm.hasher_config().to_hasher();
        let hash = hasher.hash_image(image);
        let bytes = hash.as_bytes().to_vec();

        if bytes.is_empty() {
            return Err(LikenessError::Comparison(format!(
                "{} hash produced no bits",
                self.algorithm
            )));
        }

        Ok(PerceptualHash::from_bytes(bytes, self.algorithm))
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

/// Hash both images independently and return their normalized similarity.
///
/// Dimensions do not need to match.
pub fn phash_similarity(
    hasher: &PerceptualHasher,
    a: &DynamicImage,
    b: &DynamicImage,
) -> Result<f64> {
    let hash_a = hasher.hash_image(a)?;
    let hash_b = hasher.hash_image(b)?;
    hash_a.similarity(&hash_b)
}

/// Hamming distance between two hash byte arrays.
///
/// `None` if either array is empty or their lengths differ.
pub fn hamming_distance(hash1: &[u8], hash2: &[u8]) -> Option<u32> {
    if hash1.is_empty() || hash1.len() != hash2.len() {
        return None;
    }

    Some(
        hash1
            .iter()
            .zip(hash2)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum(),
    )
}
