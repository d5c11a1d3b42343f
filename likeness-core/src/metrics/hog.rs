//! Histogram of oriented gradients (HOG) descriptor.
//!
//! The image is first resized to a fixed square so every descriptor has the
//! same length, then described with 9 unsigned orientation bins per
//! 16×16-pixel cell and L2-normalized 2×2-cell blocks.

use image::imageops::FilterType;
use image::DynamicImage;

use super::features::FeatureExtractor;
use crate::error::{LikenessError, Result};

/// Default side of the square the input is resized to.
pub const DEFAULT_HOG_SIZE: u32 = 128;

const EPS: f32 = 1e-5;

/// Parameters of the HOG descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HogConfig {
    /// Side of the square working image, in pixels.
    pub size: u32,
    /// Side of one cell, in pixels.
    pub pixels_per_cell: u32,
    /// Side of one normalization block, in cells.
    pub cells_per_block: u32,
    /// Orientation bins over [0, 180) degrees.
    pub orientations: usize,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_HOG_SIZE,
            pixels_per_cell: 16,
            cells_per_block: 2,
            orientations: 9,
        }
    }
}

impl HogConfig {
    fn cells(&self) -> usize {
        (self.size / self.pixels_per_cell) as usize
    }

    fn blocks(&self) -> usize {
        (self.cells() + 1).saturating_sub(self.cells_per_block as usize)
    }

    /// Number of values in one descriptor.
    pub fn descriptor_len(&self) -> usize {
        let per_block = (self.cells_per_block * self.cells_per_block) as usize * self.orientations;
        self.blocks() * self.blocks() * per_block
    }
}

/// HOG feature extractor.
#[derive(Debug, Clone, Default)]
pub struct HogExtractor {
    config: HogConfig,
}

impl HogExtractor {
    pub fn new(config: HogConfig) -> Result<Self> {
        if config.pixels_per_cell == 0 || config.cells_per_block == 0 || config.orientations == 0 {
            return Err(LikenessError::Configuration(
                "HOG cell, block and orientation counts must be non-zero".into(),
            ));
        }
        if config.descriptor_len() == 0 {
            return Err(LikenessError::Configuration(format!(
                "HOG working size {} is too small for {}px cells in {}-cell blocks",
                config.size, config.pixels_per_cell, config.cells_per_block
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &HogConfig {
        &self.config
    }

    fn cell_histograms(&self, gray: &[f32]) -> Vec<f32> {
        let HogConfig {
            size,
            pixels_per_cell,
            orientations,
            ..
        } = self.config;
        let size = size as usize;
        let ppc = pixels_per_cell as usize;
        let cells = self.config.cells();
        let bin_width = 180.0 / orientations as f32;
        let cell_area = (ppc * ppc) as f32;

        let mut hist = vec![0.0f32; cells * cells * orientations];

        for y in 0..cells * ppc {
            for x in 0..cells * ppc {
                // Central differences, zero on the border rows/columns.
                let gx = if x > 0 && x + 1 < size {
                    gray[y * size + x + 1] - gray[y * size + x - 1]
                } else {
                    0.0
                };
                let gy = if y > 0 && y + 1 < size {
                    gray[(y + 1) * size + x] - gray[(y - 1) * size + x]
                } else {
                    0.0
                };

                let magnitude = gx.hypot(gy);
                if magnitude == 0.0 {
                    continue;
                }

                let angle = gy.atan2(gx).to_degrees().rem_euclid(180.0);
                let bin = ((angle / bin_width) as usize).min(orientations - 1);
                let cell = (y / ppc) * cells + x / ppc;
                hist[cell * orientations + bin] += magnitude / cell_area;
            }
        }

        hist
    }
}

impl FeatureExtractor for HogExtractor {
    fn name(&self) -> &'static str {
        "hog"
    }

    fn dimension(&self) -> usize {
        self.config.descriptor_len()
    }

    fn extract(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let size = self.config.size;
        let gray: Vec<f32> = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_luma8()
            .into_raw()
            .into_iter()
            .map(f32::from)
            .collect();

        let hist = self.cell_histograms(&gray);

        let cells = self.config.cells();
        let cpb = self.config.cells_per_block as usize;
        let orientations = self.config.orientations;
        let blocks = self.config.blocks();

        let mut descriptor = Vec::with_capacity(self.dimension());
        let mut block = Vec::with_capacity(cpb * cpb * orientations);

        for by in 0..blocks {
            for bx in 0..blocks {
                block.clear();
                for cy in by..by + cpb {
                    for cx in bx..bx + cpb {
                        let start = (cy * cells + cx) * orientations;
                        block.extend_from_slice(&hist[start..start + orientations]);
                    }
                }

                let norm = (block.iter().map(|v| v * v).sum::<f32>() + EPS * EPS).sqrt();
                descriptor.extend(block.iter().map(|v| v / norm));
            }
        }

        Ok(descriptor)
    }
}
