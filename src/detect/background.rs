//! Background color-key detection for sheets without usable alpha.

use image::GrayImage;
use serde::Serialize;
use tracing::debug;

use crate::config::{BackgroundConfig, DetectionConfig};
use crate::sampler::{opaque_ratio, Sampler};
use crate::segment::label::count_components;
use crate::segment::mask::{color_key_mask, foreground_count};

/// A background color with the tolerance used to separate sprites from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorKey {
    pub color: [u8; 3],
    pub tolerance: u8,
    /// Share of pixels matching the background, in percent.
    pub background_percent: f64,
    /// Connected sprite components in the mask.
    pub components: u32,
    /// Sprite pixels are 255, background 0.
    #[serde(skip)]
    pub mask: GrayImage,
}

impl ColorKey {
    /// Build the sprite mask for `color` at `tolerance` and measure it.
    pub fn build<S: Sampler + ?Sized>(image: &S, color: [u8; 3], tolerance: u8) -> Self {
        let mask = color_key_mask(image, color, tolerance);
        let total = image.width() as u64 * image.height() as u64;
        let sprite = foreground_count(&mask);
        let background_percent = if total == 0 {
            0.0
        } else {
            100.0 * (total - sprite) as f64 / total as f64
        };
        let components = count_components(&mask);

        Self {
            color,
            tolerance,
            background_percent,
            components,
            mask,
        }
    }

    /// Background coverage plus a bonus of one point per ten components,
    /// capped at 50.
    pub fn score(&self) -> f64 {
        self.background_percent + (self.components as f64 / 10.0).min(50.0)
    }

    fn is_usable(&self, min_coverage: f64) -> bool {
        self.background_percent > min_coverage && self.components > 0
    }
}

pub struct BackgroundDetector<'a> {
    config: &'a BackgroundConfig,
}

impl<'a> BackgroundDetector<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self {
            config: &config.background,
        }
    }

    /// True when nearly every pixel is opaque, so alpha says nothing
    /// about sprite boundaries.
    pub fn alpha_uninformative<S: Sampler + ?Sized>(&self, image: &S) -> bool {
        opaque_ratio(image, self.config.opaque_alpha) >= self.config.opaque_ratio
    }

    /// Most frequent of the four corner colors. Ties go to the first
    /// corner in TL, TR, BL, BR order.
    pub fn corner_color<S: Sampler + ?Sized>(&self, image: &S) -> [u8; 3] {
        let (right, bottom) = (image.width() - 1, image.height() - 1);
        let corners: Vec<[u8; 3]> = [(0, 0), (right, 0), (0, bottom), (right, bottom)]
            .iter()
            .map(|&(x, y)| {
                let [r, g, b, _] = image.rgba(x, y);
                [r, g, b]
            })
            .collect();

        let mut best = corners[0];
        let mut best_count = 0;
        for color in &corners {
            let count = corners.iter().filter(|c| *c == color).count();
            if count > best_count {
                best = *color;
                best_count = count;
            }
        }
        best
    }

    /// Best color key for the corner color, without the opacity gate.
    pub fn detect_color_key<S: Sampler + ?Sized>(&self, image: &S) -> Option<ColorKey> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }

        let color = self.corner_color(image);
        let mut best: Option<ColorKey> = None;

        for &tolerance in &self.config.tolerances {
            let key = ColorKey::build(image, color, tolerance);
            debug!(
                ?color,
                tolerance,
                background = key.background_percent,
                components = key.components,
                score = key.score(),
                "Color key tested"
            );
            if !key.is_usable(self.config.min_coverage) {
                continue;
            }
            if best.as_ref().map_or(true, |b| key.score() > b.score()) {
                best = Some(key);
            }
        }

        best
    }

    /// Color key for sheets whose alpha channel is uninformative.
    pub fn detect<S: Sampler + ?Sized>(&self, image: &S) -> Option<ColorKey> {
        if image.width() == 0 || image.height() == 0 || !self.alpha_uninformative(image) {
            return None;
        }
        self.detect_color_key(image)
    }
}

/// Background color and tolerance for an opaque sheet, if one stands out.
pub fn detect_background_color<S: Sampler + ?Sized>(image: &S) -> Option<([u8; 3], u8)> {
    let config = DetectionConfig::default();
    BackgroundDetector::new(&config)
        .detect(image)
        .map(|key| (key.color, key.tolerance))
}

/// Full color-key result with the default configuration.
pub fn detect_color_key<S: Sampler + ?Sized>(image: &S) -> Option<ColorKey> {
    let config = DetectionConfig::default();
    BackgroundDetector::new(&config).detect(image)
}
