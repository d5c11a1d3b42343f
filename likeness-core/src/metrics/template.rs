//! Template matching between two equal-sized images.
//!
//! With the "template" as large as the searched image there is exactly one
//! window, so the result map collapses to a single normalized correlation
//! coefficient (TM_CCOEFF_NORMED semantics) computed over the RGB channels.

use image::{DynamicImage, GenericImageView};

/// Normalized correlation coefficient of `template` against `image`.
///
/// Returns `None` when the two images differ in size; template matching is
/// only applied to same-sized inputs. A flat (zero-variance) template
/// matches everywhere and yields 1.0; a flat image against a textured
/// template yields 0.0.
pub fn match_template(image: &DynamicImage, template: &DynamicImage) -> Option<f64> {
    if image.dimensions() != template.dimensions() {
        return None;
    }

    let a = image.to_rgb8();
    let b = template.to_rgb8();
    let pixels = f64::from(a.width()) * f64::from(a.height());
    if pixels == 0.0 {
        return Some(0.0);
    }

    let channel_means = |buf: &image::RgbImage| {
        let mut sums = [0.0f64; 3];
        for p in buf.pixels() {
            for (c, sum) in sums.iter_mut().enumerate() {
                *sum += f64::from(p[c]);
            }
        }
        sums.map(|s| s / pixels)
    };
    let mean_a = channel_means(&a);
    let mean_b = channel_means(&b);

    let (mut cross, mut energy_a, mut energy_b) = (0.0f64, 0.0f64, 0.0f64);
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        for c in 0..3 {
            let da = f64::from(pa[c]) - mean_a[c];
            let db = f64::from(pb[c]) - mean_b[c];
            cross += da * db;
            energy_a += da * da;
            energy_b += db * db;
        }
    }

    if energy_b <= f64::EPSILON {
        return Some(1.0);
    }
    let denom = (energy_a * energy_b).sqrt();
    if denom <= f64::EPSILON {
        return Some(0.0);
    }

    Some((cross / denom).clamp(-1.0, 1.0))
}
