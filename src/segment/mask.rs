//! Binary foreground masks.

use image::{GrayImage, Luma};

use crate::sampler::Sampler;

pub const FOREGROUND: Luma<u8> = Luma([255]);
pub const BACKGROUND: Luma<u8> = Luma([0]);

/// Foreground wherever alpha is above `threshold`.
pub fn alpha_mask<S: Sampler + ?Sized>(image: &S, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.alpha(x, y) > threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

/// Foreground wherever any RGB channel differs from `color` by more
/// than `tolerance`.
pub fn color_key_mask<S: Sampler + ?Sized>(image: &S, color: [u8; 3], tolerance: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.rgba(x, y);
        let differs = [r, g, b]
            .iter()
            .zip(color.iter())
            .any(|(&c, &k)| c.abs_diff(k) > tolerance);
        if differs {
            FOREGROUND
        } else {
            BACKGROUND
        }
    })
}

pub fn foreground_count(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p.0[0] != 0).count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_alpha_mask_threshold() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 128]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 129]));
        let mask = alpha_mask(&img, 128);
        assert_eq!(mask.get_pixel(0, 0), &BACKGROUND);
        assert_eq!(mask.get_pixel(1, 0), &FOREGROUND);
        assert_eq!(foreground_count(&mask), 1);
    }

    #[test]
    fn test_color_key_mask_tolerance() {
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 0, Rgba([115, 100, 100, 255]));
        img.put_pixel(2, 0, Rgba([100, 100, 116, 255]));

        let mask = color_key_mask(&img, [100, 100, 100], 15);
        assert_eq!(foreground_count(&mask), 1);
        assert_eq!(mask.get_pixel(2, 0), &FOREGROUND);
    }
}
