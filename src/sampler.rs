//! Pixel access for detectors.
//!
//! Every detector reads pixels through [`Sampler`] and never mutates the
//! image, so one sheet can be shared read-only across threads.

use image::RgbaImage;

use crate::error::{DetectError, Result};

/// Read-only RGBA access to a 2-D pixel buffer.
pub trait Sampler {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// RGBA of the pixel at `(x, y)`. Callers keep coordinates in bounds.
    fn rgba(&self, x: u32, y: u32) -> [u8; 4];

    fn alpha(&self, x: u32, y: u32) -> u8 {
        self.rgba(x, y)[3]
    }

    /// True when the pixel's alpha is above `threshold`.
    fn is_solid(&self, x: u32, y: u32, threshold: u8) -> bool {
        self.alpha(x, y) > threshold
    }
}

impl Sampler for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).0
    }
}

/// Reject empty images up front.
pub fn ensure_image<S: Sampler + ?Sized>(image: &S) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectError::NoImage);
    }
    Ok(())
}

/// Fraction of pixels whose alpha is above `threshold`.
pub fn opaque_ratio<S: Sampler + ?Sized>(image: &S, threshold: u8) -> f64 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let mut opaque = 0u64;
    for y in 0..image.height() {
        for x in 0..image.width() {
            if image.is_solid(x, y, threshold) {
                opaque += 1;
            }
        }
    }

    opaque as f64 / total as f64
}
