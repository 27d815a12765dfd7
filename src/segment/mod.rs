//! Connected-component sprite segmentation.
//!
//! Binarize (alpha, or a background color key for opaque sheets), label
//! 4-connected components, drop specks, merge fragments of multi-part
//! sprites, then either infer a uniform grid from component centers or
//! fall back to a representative sprite size. The exact sprite
//! rectangles are always kept.

pub mod label;
pub mod layout;
pub mod mask;
mod merge;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::detect::background::{BackgroundDetector, ColorKey};
use crate::error::{DetectError, Result};
use crate::sampler::{ensure_image, Sampler};
use crate::types::Rect;

pub use layout::{SizeAlternatives, SizeStats};
pub use merge::merge_components;

use layout::{choose_fallback, infer_grid, is_irregular, mode_size, FallbackChoice};

/// Confidence of a segmentation layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentConfidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for SegmentConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SegmentConfidence::High => "high",
            SegmentConfidence::Medium => "medium",
            SegmentConfidence::Low => "low",
        };
        f.write_str(label)
    }
}

/// How the frame size was derived from the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LayoutMethod {
    /// Uniform grid inferred from component centers.
    Grid { cols: u32, rows: u32 },
    /// Most frequent sprite size.
    Mode,
    /// Median sprite size.
    Median,
}

impl fmt::Display for LayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMethod::Grid { cols, rows } => write!(f, "grid {}x{}", cols, rows),
            LayoutMethod::Mode => f.write_str("mode"),
            LayoutMethod::Median => f.write_str("median"),
        }
    }
}

/// Result of one segmentation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationOutcome {
    pub sprite_bounds: Vec<Rect>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub spacing_x: u32,
    pub spacing_y: u32,
    pub irregular: bool,
    pub confidence: SegmentConfidence,
    pub method: LayoutMethod,
    pub size_alternatives: SizeAlternatives,
    /// Color key that replaced the alpha mask, if any.
    pub color_key: Option<ColorKey>,
    pub messages: Vec<String>,
}

impl SegmentationOutcome {
    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn sprite_count(&self) -> usize {
        self.sprite_bounds.len()
    }

    /// Most frequent size among the retained sprite rectangles.
    pub fn dominant_size(&self) -> Option<(u32, u32)> {
        mode_size(&self.sprite_bounds).map(|(size, _)| size)
    }
}

pub struct Segmenter<'a> {
    config: &'a DetectionConfig,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Segment `image`. An explicit `(rgb, tolerance)` background forces a
    /// color-key mask; otherwise opaque sheets try to find one.
    pub fn segment<S: Sampler + ?Sized>(
        &self,
        image: &S,
        background: Option<([u8; 3], u8)>,
    ) -> Result<SegmentationOutcome> {
        ensure_image(image)?;
        let seg = &self.config.segmentation;
        let (sheet_w, sheet_h) = (image.width(), image.height());
        let mut messages = Vec::new();

        let alpha = mask::alpha_mask(image, seg.mask_alpha);
        let total = sheet_w as u64 * sheet_h as u64;
        let opaque = mask::foreground_count(&alpha);
        messages.push(format!(
            "Alpha mask: {}/{} opaque ({:.1}%)",
            opaque,
            total,
            100.0 * opaque as f64 / total as f64
        ));

        let color_key = match background {
            Some((color, tolerance)) => Some(ColorKey::build(image, color, tolerance)),
            None => BackgroundDetector::new(self.config).detect(image),
        };
        let binary = match &color_key {
            Some(key) => {
                messages.push(format!(
                    "Color key: RGB({}, {}, {}) tolerance {}, {:.1}% background",
                    key.color[0], key.color[1], key.color[2], key.tolerance, key.background_percent
                ));
                &key.mask
            }
            None => &alpha,
        };

        let labelled = label::label_components(binary);
        messages.push(format!("Found {} connected components", labelled.len()));

        let bounds: Vec<Rect> = labelled
            .into_iter()
            .filter(|r| r.width >= seg.min_component && r.height >= seg.min_component)
            .collect();
        messages.push(format!("Valid components: {}", bounds.len()));

        let Some(stats) = SizeStats::of(&bounds) else {
            return Err(DetectError::InsufficientComponents { found: 0 });
        };

        let irregular = is_irregular(&bounds, &stats, seg);
        messages.push(format!(
            "Analysis: {} sprites, diversity={:.1}, irregular={}",
            bounds.len(),
            stats.diversity(),
            irregular
        ));

        let merged = if irregular {
            bounds
        } else {
            merge_components(&bounds, seg.merge_distance, seg.merge_padding)
        };
        messages.push(format!("After merging: {} sprites", merged.len()));

        let Some(stats) = SizeStats::of(&merged) else {
            return Err(DetectError::InsufficientComponents { found: 0 });
        };
        let size_alternatives = SizeAlternatives::of(&merged, &stats);
        debug!(
            sprites = merged.len(),
            std_w = stats.std_w,
            std_h = stats.std_h,
            "Component statistics"
        );

        if stats.is_uniform(seg.uniform_std) && merged.len() >= 2 {
            let fit = infer_grid(&merged, &stats, sheet_w, sheet_h, seg);
            let confidence = if (fit.cols * fit.rows) as usize == merged.len() {
                SegmentConfidence::High
            } else {
                SegmentConfidence::Medium
            };
            messages.push(format!(
                "Grid: {}x{}, frame: {}x{}, confidence: {}",
                fit.cols, fit.rows, fit.frame_width, fit.frame_height, confidence
            ));
            info!(
                cols = fit.cols,
                rows = fit.rows,
                frame_width = fit.frame_width,
                frame_height = fit.frame_height,
                "Grid inferred from components"
            );

            return Ok(SegmentationOutcome {
                sprite_bounds: merged,
                frame_width: fit.frame_width,
                frame_height: fit.frame_height,
                offset_x: 0,
                offset_y: 0,
                spacing_x: 0,
                spacing_y: 0,
                irregular: false,
                confidence,
                method: LayoutMethod::Grid {
                    cols: fit.cols,
                    rows: fit.rows,
                },
                size_alternatives,
                color_key,
                messages,
            });
        }

        let mode_count = mode_size(&merged).map_or(0, |(_, count)| count);
        let ((frame_w, frame_h), choice) =
            choose_fallback(&size_alternatives, mode_count, merged.len(), seg);
        let method = match choice {
            FallbackChoice::Mode => LayoutMethod::Mode,
            FallbackChoice::Median => LayoutMethod::Median,
        };
        let confidence = if irregular {
            SegmentConfidence::Low
        } else {
            SegmentConfidence::Medium
        };
        messages.push(format!(
            "{}: {}x{} ({}), {} sprites",
            if irregular { "Irregular collection" } else { "Mixed sizes" },
            frame_w,
            frame_h,
            method,
            merged.len()
        ));
        info!(frame_w, frame_h, %method, irregular, "Fallback sprite size chosen");

        Ok(SegmentationOutcome {
            sprite_bounds: merged,
            frame_width: frame_w,
            frame_height: frame_h,
            offset_x: 0,
            offset_y: 0,
            spacing_x: 0,
            spacing_y: 0,
            irregular,
            confidence,
            method,
            size_alternatives,
            color_key,
            messages,
        })
    }
}

/// Segment with the default configuration.
pub fn segment_ccl<S: Sampler + ?Sized>(
    image: &S,
    background: Option<([u8; 3], u8)>,
) -> Result<SegmentationOutcome> {
    let config = DetectionConfig::default();
    Segmenter::new(&config).segment(image, background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fill, inset_sheet, CLEAR, RED};
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_square() {
        let mut img = RgbaImage::from_pixel(100, 80, CLEAR);
        fill(&mut img, 30, 20, 40, 40, RED);

        let outcome = segment_ccl(&img, None).unwrap();
        assert_eq!(outcome.sprite_bounds, vec![Rect::new(30, 20, 40, 40)]);
        assert_eq!(outcome.frame_size(), (40, 40));
        assert_eq!(outcome.method, LayoutMethod::Mode);
        assert!(!outcome.irregular);
    }

    #[test]
    fn test_regular_grid() {
        let img = inset_sheet(4, 4, 32, 2);
        let outcome = segment_ccl(&img, None).unwrap();

        assert_eq!(outcome.sprite_count(), 16);
        assert_eq!(outcome.method, LayoutMethod::Grid { cols: 4, rows: 4 });
        assert_eq!(outcome.frame_size(), (32, 32));
        assert_eq!(outcome.confidence, SegmentConfidence::High);
        assert!(!outcome.irregular);
        assert_eq!(outcome.dominant_size(), Some((28, 28)));
    }

    #[test]
    fn test_specks_discarded() {
        let mut img = RgbaImage::from_pixel(64, 64, CLEAR);
        fill(&mut img, 0, 0, 7, 30, RED);
        fill(&mut img, 20, 20, 5, 5, RED);
        assert!(matches!(
            segment_ccl(&img, None),
            Err(DetectError::InsufficientComponents { found: 0 })
        ));
    }

    #[test]
    fn test_fragments_merged() {
        // Head and body of one sprite, 2px apart vertically.
        let mut img = RgbaImage::from_pixel(64, 64, CLEAR);
        fill(&mut img, 10, 10, 12, 10, RED);
        fill(&mut img, 10, 22, 12, 14, RED);

        let outcome = segment_ccl(&img, None).unwrap();
        assert_eq!(outcome.sprite_bounds, vec![Rect::new(10, 10, 12, 26)]);
    }

    #[test]
    fn test_irregular_collection_not_merged() {
        // 64 sprites with widely varying sizes, one per 96px cell.
        let mut img = RgbaImage::from_pixel(800, 800, CLEAR);
        let mut expected = Vec::new();
        for i in 0..64u32 {
            let (col, row) = (i % 8, i / 8);
            let w = 8 + (i * 7) % 80;
            let h = 8 + (i * 11) % 80;
            let (x, y) = (col * 96 + 4, row * 96 + 4);
            fill(&mut img, x, y, w, h, RED);
            expected.push(Rect::new(x, y, w, h));
        }

        let outcome = segment_ccl(&img, None).unwrap();
        assert!(outcome.irregular);
        assert_eq!(outcome.sprite_count(), 64);
        assert_eq!(outcome.confidence, SegmentConfidence::Low);

        let mut found = outcome.sprite_bounds.clone();
        found.sort_by_key(|r| (r.y, r.x));
        expected.sort_by_key(|r| (r.y, r.x));
        assert_eq!(found, expected);
    }

    #[test]
    fn test_color_key_replaces_alpha() {
        let mut img = RgbaImage::from_pixel(64, 64, Rgba([255, 0, 255, 255]));
        for (x, y) in [(4, 4), (36, 4), (4, 36), (36, 36)] {
            fill(&mut img, x, y, 24, 24, Rgba([30, 30, 200, 255]));
        }

        let outcome = segment_ccl(&img, Some(([255, 0, 255], 25))).unwrap();
        assert_eq!(outcome.sprite_count(), 4);
        assert_eq!(outcome.method, LayoutMethod::Grid { cols: 2, rows: 2 });
        assert_eq!(outcome.color_key.as_ref().map(|k| k.tolerance), Some(25));
    }

    #[test]
    fn test_opaque_sheet_without_key_is_one_component() {
        let img = RgbaImage::from_pixel(32, 32, RED);
        let outcome = segment_ccl(&img, None).unwrap();
        assert!(outcome.color_key.is_none());
        assert_eq!(outcome.sprite_bounds, vec![Rect::new(0, 0, 32, 32)]);
    }
}
