//! Transparent margin detection.
//!
//! Scans each edge inward for the first line holding a non-transparent
//! pixel, then sanity-checks the left/top offsets.

use tracing::debug;

use crate::config::{DetectionConfig, MarginConfig};
use crate::error::{DetectError, Result};
use crate::sampler::{ensure_image, Sampler};
use crate::types::Detected;

/// Raw edge measurements before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawMargins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

/// Validated offsets plus the raw measurements they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub offset_x: u32,
    pub offset_y: u32,
    pub raw: RawMargins,
}

impl Margins {
    pub fn offset(&self) -> (u32, u32) {
        (self.offset_x, self.offset_y)
    }
}

pub struct MarginDetector<'a> {
    config: &'a MarginConfig,
    alpha_threshold: u8,
}

impl<'a> MarginDetector<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self {
            config: &config.margins,
            alpha_threshold: config.alpha_threshold,
        }
    }

    /// Detect left/top offsets. A known frame size tightens validation.
    pub fn detect<S: Sampler + ?Sized>(
        &self,
        image: &S,
        frame_width: Option<u32>,
        frame_height: Option<u32>,
    ) -> Result<Detected<Margins>> {
        ensure_image(image)?;
        let (width, height) = (image.width(), image.height());

        let raw = self.raw_margins(image);
        let frame = match (frame_width, frame_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            (Some(0), _) | (_, Some(0)) => {
                return Err(DetectError::frame_size(
                    frame_width.unwrap_or(0),
                    frame_height.unwrap_or(0),
                    "frame hint must be greater than 0",
                ))
            }
            _ => None,
        };

        let (offset_x, offset_y, notes) = self.validate(raw, width, height, frame);
        debug!(?raw, offset_x, offset_y, "Margins measured");

        let content_w = width.saturating_sub(raw.left + raw.right);
        let content_h = height.saturating_sub(raw.top + raw.bottom);

        let mut message = format!(
            "Margins: L={}, R={}, T={}, B={} | Validated: X={}, Y={} | Content: {}x{}",
            raw.left, raw.right, raw.top, raw.bottom, offset_x, offset_y, content_w, content_h
        );
        if raw.left == width {
            message.push_str(" | No content found");
        }
        if !notes.is_empty() {
            message.push_str(" | ");
            message.push_str(&notes.join("; "));
        }

        Ok(Detected::new(
            Margins {
                offset_x,
                offset_y,
                raw,
            },
            message,
        ))
    }

    fn column_empty<S: Sampler + ?Sized>(&self, image: &S, x: u32) -> bool {
        (0..image.height()).all(|y| !image.is_solid(x, y, self.alpha_threshold))
    }

    fn row_empty<S: Sampler + ?Sized>(&self, image: &S, y: u32) -> bool {
        (0..image.width()).all(|x| !image.is_solid(x, y, self.alpha_threshold))
    }

    fn raw_margins<S: Sampler + ?Sized>(&self, image: &S) -> RawMargins {
        let (width, height) = (image.width(), image.height());

        let left = (0..width).take_while(|&x| self.column_empty(image, x)).count() as u32;
        let right = (0..width)
            .rev()
            .take_while(|&x| self.column_empty(image, x))
            .count() as u32;
        let top = (0..height).take_while(|&y| self.row_empty(image, y)).count() as u32;
        let bottom = (0..height)
            .rev()
            .take_while(|&y| self.row_empty(image, y))
            .count() as u32;

        RawMargins {
            left,
            right,
            top,
            bottom,
        }
    }

    fn validate(
        &self,
        raw: RawMargins,
        width: u32,
        height: u32,
        frame: Option<(u32, u32)>,
    ) -> (u32, u32, Vec<String>) {
        let mut notes = Vec::new();
        let mut left = raw.left;
        let mut top = raw.top;

        let max_x = (width as f64 * self.config.max_fraction) as u32;
        let max_y = (height as f64 * self.config.max_fraction) as u32;

        if left > max_x {
            notes.push(format!("Left margin {}px excessive (>{}px), reset to 0", left, max_x));
            left = 0;
        }
        if top > max_y {
            notes.push(format!("Top margin {}px excessive (>{}px), reset to 0", top, max_y));
            top = 0;
        }

        if let Some((frame_w, frame_h)) = frame {
            if (width - left) % frame_w != 0 {
                if let Some(reduced) = (0..left).rev().find(|&l| (width - l) % frame_w == 0) {
                    notes.push(format!("Adjusted left margin to {} for clean frame division", reduced));
                    left = reduced;
                }
            }
            if (height - top) % frame_h != 0 {
                if let Some(reduced) = (0..top).rev().find(|&t| (height - t) % frame_h == 0) {
                    notes.push(format!("Adjusted top margin to {} for clean frame division", reduced));
                    top = reduced;
                }
            }
        }

        if width as f64 / height as f64 > self.config.strip_ratio {
            if left > self.config.strip_cap {
                left = self.config.strip_cap;
                notes.push("Reduced margins for horizontal strip".to_string());
            }
            if top > self.config.strip_cap {
                top = self.config.strip_cap;
                notes.push("Reduced top margin for horizontal strip".to_string());
            }
        }

        if left <= self.config.noise {
            left = 0;
        }
        if top <= self.config.noise {
            top = 0;
        }

        (left, top, notes)
    }
}

/// Detect margins with the default configuration.
pub fn detect_margins<S: Sampler + ?Sized>(
    image: &S,
    frame_width: Option<u32>,
    frame_height: Option<u32>,
) -> Result<Detected<Margins>> {
    let config = DetectionConfig::default();
    MarginDetector::new(&config).detect(image, frame_width, frame_height)
}
