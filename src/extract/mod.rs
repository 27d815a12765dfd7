//! Frame extraction from a sprite sheet.
//!
//! Regular sheets are cut along their [`FrameLayout`] grid; irregular ones
//! by the exact sprite rectangles segmentation found.

mod export;

use image::RgbaImage;

use crate::error::{DetectError, Result};
use crate::types::{FrameLayout, Rect};

pub use export::{frame_name, write_frames, write_frames_json};

/// A single frame cut out of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrame {
    /// Position in grid or sprite order, counting skipped frames.
    pub index: usize,
    pub rect: Rect,
    pub image: RgbaImage,
}

/// Returns true if every pixel in the image has alpha == 0.
fn is_fully_transparent(img: &RgbaImage) -> bool {
    img.pixels().all(|p| p[3] == 0)
}

fn crop_all(image: &RgbaImage, rects: Vec<Rect>, skip_empty: bool) -> Vec<ExtractedFrame> {
    rects
        .into_iter()
        .enumerate()
        .filter_map(|(index, rect)| {
            let sub =
                image::imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
            if skip_empty && is_fully_transparent(&sub) {
                return None;
            }
            Some(ExtractedFrame {
                index,
                rect,
                image: sub,
            })
        })
        .collect()
}

/// Crop every grid cell of `layout`, row-major.
pub fn extract_frames(
    image: &RgbaImage,
    layout: &FrameLayout,
    skip_empty: bool,
) -> Result<Vec<ExtractedFrame>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::NoImage);
    }
    layout.validate(width, height)?;

    Ok(crop_all(image, layout.frame_rects(width, height), skip_empty))
}

/// Crop exact sprite rectangles.
pub fn extract_sprites(
    image: &RgbaImage,
    rects: &[Rect],
    skip_empty: bool,
) -> Result<Vec<ExtractedFrame>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::NoImage);
    }

    if let Some(bad) = rects
        .iter()
        .find(|r| r.width == 0 || r.height == 0 || !r.fits_within(width, height))
    {
        return Err(DetectError::frame_size(
            bad.width,
            bad.height,
            format!(
                "sprite at ({}, {}) does not fit the {}x{} sheet",
                bad.x, bad.y, width, height
            ),
        ));
    }

    Ok(crop_all(image, rects.to_vec(), skip_empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fill, tile_sheet, CLEAR, RED};

    #[test]
    fn test_is_fully_transparent() {
        let img = RgbaImage::from_pixel(4, 4, CLEAR);
        assert!(is_fully_transparent(&img));
    }

    #[test]
    fn test_is_not_fully_transparent() {
        let mut img = RgbaImage::from_pixel(4, 4, CLEAR);
        img.put_pixel(2, 2, RED);
        assert!(!is_fully_transparent(&img));
    }

    #[test]
    fn test_extract_grid_with_offset_and_spacing() {
        let img = tile_sheet(3, 2, 16, 4, 2, 2, 2, 0);
        let layout = FrameLayout::new(16, 16).with_offset(4, 2).with_spacing(2, 2);
        let frames = extract_frames(&img, &layout, false).unwrap();

        assert_eq!(frames.len(), 6);
        assert_eq!(frames[1].rect, Rect::new(22, 2, 16, 16));
        assert_eq!(frames[3].rect, Rect::new(4, 20, 16, 16));
        for frame in &frames {
            assert_eq!(frame.image.dimensions(), (16, 16));
            assert_eq!(frame.image.get_pixel(0, 0), &RED);
        }
    }

    #[test]
    fn test_extract_skips_empty_cells() {
        let mut img = RgbaImage::from_pixel(32, 16, CLEAR);
        fill(&mut img, 16, 0, 16, 16, RED);

        let frames = extract_frames(&img, &FrameLayout::new(16, 16), true).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].index, 1);

        let all = extract_frames(&img, &FrameLayout::new(16, 16), false).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_extract_rejects_invalid_layout() {
        let img = RgbaImage::from_pixel(16, 16, RED);
        assert!(matches!(
            extract_frames(&img, &FrameLayout::new(32, 32), false),
            Err(DetectError::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn test_extract_sprites_exact_bounds() {
        let mut img = RgbaImage::from_pixel(40, 20, CLEAR);
        fill(&mut img, 2, 3, 10, 12, RED);
        fill(&mut img, 20, 1, 17, 8, RED);

        let rects = [Rect::new(2, 3, 10, 12), Rect::new(20, 1, 17, 8)];
        let sprites = extract_sprites(&img, &rects, true).unwrap();
        assert_eq!(sprites.len(), 2);
        assert_eq!(sprites[0].image.dimensions(), (10, 12));
        assert_eq!(sprites[1].image.dimensions(), (17, 8));
    }

    #[test]
    fn test_extract_sprites_out_of_bounds() {
        let img = RgbaImage::from_pixel(16, 16, RED);
        let result = extract_sprites(&img, &[Rect::new(10, 10, 8, 8)], false);
        assert!(matches!(result, Err(DetectError::InvalidFrameSize { .. })));
    }
}
