//! Pixel-difference similarity between equal-sized grayscale images.
//!
//! Two interchangeable strategies fill the comparator's `distance_score`
//! slot: structural similarity (SSIM) and inverse mean-squared error. Both
//! report a similarity in `[0, 1]` that grows with visual closeness.

use std::fmt;
use std::str::FromStr;

use image::{DynamicImage, GenericImageView, GrayImage};
use serde::{Deserialize, Serialize};

use crate::error::{LikenessError, Result};

/// Side of the square SSIM window.
pub const SSIM_WINDOW: u32 = 7;

const SSIM_K1: f64 = 0.01;
const SSIM_K2: f64 = 0.03;
/// Dynamic range of 8-bit samples.
const DATA_RANGE: f64 = 255.0;

/// Strategy used for the distance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Mean structural similarity over 7×7 windows.
    #[default]
    Ssim,
    /// `1 / (1 + MSE)` over grayscale pixels.
    #[serde(rename = "mse")]
    InverseMse,
}

impl DistanceMetric {
    /// Score two images; `None` when their dimensions differ.
    pub fn score(self, a: &DynamicImage, b: &DynamicImage) -> Result<Option<f64>> {
        if a.dimensions() != b.dimensions() {
            return Ok(None);
        }

        let (gray_a, gray_b) = (a.to_luma8(), b.to_luma8());
        let score = match self {
            Self::Ssim => ssim(&gray_a, &gray_b)?,
            Self::InverseMse => inverse_mse(&gray_a, &gray_b)?,
        };
        Ok(Some(score))
    }

    /// Label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ssim => "SSIM Similarity Score",
            Self::InverseMse => "MSE Similarity Score",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssim => f.write_str("ssim"),
            Self::InverseMse => f.write_str("mse"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = LikenessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ssim" => Ok(Self::Ssim),
            "mse" | "inverse-mse" | "inverse_mse" | "inversemse" => Ok(Self::InverseMse),
            other => Err(LikenessError::Configuration(format!(
                "Unknown distance metric '{}' (expected ssim or mse)",
                other
            ))),
        }
    }
}

fn check_same_size(a: &GrayImage, b: &GrayImage) -> Result<()> {
    if a.dimensions() != b.dimensions() {
        return Err(LikenessError::Comparison(format!(
            "Grayscale shapes differ: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    Ok(())
}

/// Inverse mean-squared error, `1 / (1 + Σ(a - b)² / (h·w))`.
pub fn inverse_mse(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    check_same_size(a, b)?;
    let pixels = f64::from(a.width()) * f64::from(a.height());
    if pixels == 0.0 {
        return Err(LikenessError::Comparison("Cannot compare empty images".into()));
    }

    let err: f64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum();

    Ok(1.0 / (1.0 + err / pixels))
}

/// Summed-area table with one row and column of zero padding.
struct Integral {
    width: usize,
    data: Vec<f64>,
}

impl Integral {
    fn new(width: usize, height: usize, value: impl Fn(usize, usize) -> f64) -> Self {
        let stride = width + 1;
        let mut data = vec![0.0; stride * (height + 1)];
        for y in 0..height {
            let mut row = 0.0;
            for x in 0..width {
                row += value(x, y);
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row;
            }
        }
        Self { width, data }
    }

    /// Sum over the `w`×`h` rectangle with top-left corner `(x, y)`.
    fn sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let stride = self.width + 1;
        let at = |xx: usize, yy: usize| self.data[yy * stride + xx];
        at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y)
    }
}

/// Mean structural similarity, clamped to `[0, 1]`.
///
/// Uses a 7×7 uniform window with sample covariance and averages over every
/// window that lies fully inside the image. Images smaller than the window
/// cannot be scored.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64> {
    check_same_size(a, b)?;
    let (width, height) = a.dimensions();
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        return Err(LikenessError::Comparison(format!(
            "SSIM needs images of at least {0}x{0} pixels, got {1}x{2}",
            SSIM_WINDOW, width, height
        )));
    }

    let (w, h) = (width as usize, height as usize);
    let pa = a.as_raw();
    let pb = b.as_raw();
    let px = |buf: &[u8], x: usize, y: usize| f64::from(buf[y * w + x]);

    let sum_a = Integral::new(w, h, |x, y| px(pa, x, y));
    let sum_b = Integral::new(w, h, |x, y| px(pb, x, y));
    let sum_aa = Integral::new(w, h, |x, y| px(pa, x, y).powi(2));
    let sum_bb = Integral::new(w, h, |x, y| px(pb, x, y).powi(2));
    let sum_ab = Integral::new(w, h, |x, y| px(pa, x, y) * px(pb, x, y));

    let win = SSIM_WINDOW as usize;
    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (SSIM_K1 * DATA_RANGE).powi(2);
    let c2 = (SSIM_K2 * DATA_RANGE).powi(2);

    let mut total = 0.0;
    let mut windows = 0usize;
    for y in 0..=h - win {
        for x in 0..=w - win {
            let ux = sum_a.sum(x, y, win, win) / np;
            let uy = sum_b.sum(x, y, win, win) / np;
            let uxx = sum_aa.sum(x, y, win, win) / np;
            let uyy = sum_bb.sum(x, y, win, win) / np;
            let uxy = sum_ab.sum(x, y, win, win) / np;

            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
            let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }

    Ok((total / windows as f64).clamp(0.0, 1.0))
}
