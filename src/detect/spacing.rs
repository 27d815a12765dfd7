//! Inter-frame spacing detection.
//!
//! For each axis, every candidate gap width is probed at a few
//! successive positions after the first frame. A probe counts when the
//! gap strip is transparent and the next frame shows up right after it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DetectionConfig, SpacingConfig};
use crate::error::{DetectError, Result};
use crate::sampler::{ensure_image, Sampler};
use crate::types::Detected;

/// Bucketed spacing confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingConfidence {
    High,
    Medium,
    Low,
}

impl SpacingConfidence {
    pub fn from_consistency(consistency: f64) -> Self {
        if consistency >= 0.8 {
            SpacingConfidence::High
        } else if consistency >= 0.5 {
            SpacingConfidence::Medium
        } else {
            SpacingConfidence::Low
        }
    }
}

impl fmt::Display for SpacingConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpacingConfidence::High => "high",
            SpacingConfidence::Medium => "medium",
            SpacingConfidence::Low => "low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub x: u32,
    pub y: u32,
    pub consistency_x: f64,
    pub consistency_y: f64,
}

impl Spacing {
    /// Mean of both axis consistencies.
    pub fn consistency(&self) -> f64 {
        (self.consistency_x + self.consistency_y) / 2.0
    }

    pub fn confidence(&self) -> SpacingConfidence {
        SpacingConfidence::from_consistency(self.consistency())
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Frame geometry shared by both axis probes.
#[derive(Clone, Copy)]
struct Probe {
    frame_w: u32,
    frame_h: u32,
    offset_x: u32,
    offset_y: u32,
}

pub struct SpacingDetector<'a> {
    config: &'a SpacingConfig,
    alpha_threshold: u8,
}

impl<'a> SpacingDetector<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self {
            config: &config.spacing,
            alpha_threshold: config.alpha_threshold,
        }
    }

    pub fn detect<S: Sampler + ?Sized>(
        &self,
        image: &S,
        frame_w: u32,
        frame_h: u32,
        offset_x: u32,
        offset_y: u32,
    ) -> Result<Detected<Spacing>> {
        ensure_image(image)?;
        if frame_w == 0 || frame_h == 0 {
            return Err(DetectError::frame_size(
                frame_w,
                frame_h,
                "frame size must be greater than 0",
            ));
        }

        let probe = Probe {
            frame_w,
            frame_h,
            offset_x,
            offset_y,
        };
        let (x, consistency_x) = self.best_spacing(image, probe, Axis::Horizontal);
        let (y, consistency_y) = self.best_spacing(image, probe, Axis::Vertical);

        let spacing = Spacing {
            x,
            y,
            consistency_x,
            consistency_y,
        };
        debug!(x, y, consistency_x, consistency_y, "Spacing probed");

        let message = format!(
            "Auto-detected spacing: X={}, Y={} (confidence: {}, consistency: {:.2})",
            x,
            y,
            spacing.confidence(),
            spacing.consistency()
        );
        Ok(Detected::new(spacing, message))
    }

    /// Best gap for one axis. Ties keep the smaller gap.
    fn best_spacing<S: Sampler + ?Sized>(&self, image: &S, probe: Probe, axis: Axis) -> (u32, f64) {
        let mut best = (0, 0.0);

        for gap in 0..=self.config.max_spacing {
            if let Some(consistency) = self.consistency(image, probe, axis, gap) {
                if consistency > best.1 {
                    best = (gap, consistency);
                }
            }
        }

        best
    }

    /// Fraction of probed positions that confirm `gap`, or `None` when no
    /// position fits.
    fn consistency<S: Sampler + ?Sized>(
        &self,
        image: &S,
        probe: Probe,
        axis: Axis,
        gap: u32,
    ) -> Option<f64> {
        // Along-axis values first, cross-axis second.
        let (extent, frame, cross_frame, offset, cross_offset, cross_extent) = match axis {
            Axis::Horizontal => (
                image.width(),
                probe.frame_w,
                probe.frame_h,
                probe.offset_x,
                probe.offset_y,
                image.height(),
            ),
            Axis::Vertical => (
                image.height(),
                probe.frame_h,
                probe.frame_w,
                probe.offset_y,
                probe.offset_x,
                image.width(),
            ),
        };
        let solid = |along: u32, across: u32| match axis {
            Axis::Horizontal => image.is_solid(along, across, self.alpha_threshold),
            Axis::Vertical => image.is_solid(across, along, self.alpha_threshold),
        };

        let available = extent.saturating_sub(offset);
        let frames = if gap > 0 {
            (available + gap) / (frame + gap)
        } else {
            available / frame
        };
        let positions = self.config.positions.min(frames.saturating_sub(1));
        if positions == 0 {
            return None;
        }

        let step = self.config.sample_step.max(1) as usize;
        let mut checked = 0u32;
        let mut valid = 0u32;

        for position in 0..positions {
            let gap_start = offset + (position + 1) * frame + position * gap;
            let next = gap_start + gap;
            if next + frame > extent {
                break;
            }
            checked += 1;

            let cross_end = (cross_offset + cross_frame).min(cross_extent);
            let gap_clear = (cross_offset..cross_end)
                .step_by(step)
                .all(|across| (gap_start..next).all(|along| !solid(along, across)));
            if !gap_clear {
                continue;
            }

            let evidence_end = (cross_offset + self.config.evidence_span).min(cross_extent);
            if (cross_offset..evidence_end)
                .step_by(step)
                .any(|across| solid(next, across))
            {
                valid += 1;
            }
        }

        if checked == 0 {
            Some(0.0)
        } else {
            Some(valid as f64 / checked as f64)
        }
    }
}

/// Detect spacing with the default configuration.
pub fn detect_spacing<S: Sampler + ?Sized>(
    image: &S,
    frame_w: u32,
    frame_h: u32,
    offset_x: u32,
    offset_y: u32,
) -> Result<Detected<Spacing>> {
    let config = DetectionConfig::default();
    SpacingDetector::new(&config).detect(image, frame_w, frame_h, offset_x, offset_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tile_sheet;
    use image::RgbaImage;

    #[test]
    fn test_zero_spacing_on_packed_sheet() {
        let img = tile_sheet(4, 4, 16, 0, 0, 0, 0, 0);
        let spacing = detect_spacing(&img, 16, 16, 0, 0).unwrap().value;
        assert_eq!((spacing.x, spacing.y), (0, 0));
        assert_eq!(spacing.confidence(), SpacingConfidence::High);
    }

    #[test]
    fn test_detects_gaps_per_axis() {
        let img = tile_sheet(4, 3, 16, 0, 0, 4, 2, 0);
        let detected = detect_spacing(&img, 16, 16, 0, 0).unwrap();
        assert_eq!((detected.value.x, detected.value.y), (4, 2));
        assert_eq!(detected.value.consistency(), 1.0);
        assert!(detected.message.starts_with("Auto-detected spacing: X=4, Y=2"));
    }

    #[test]
    fn test_spacing_with_offset() {
        let img = tile_sheet(4, 4, 16, 6, 6, 4, 4, 0);
        let spacing = detect_spacing(&img, 16, 16, 6, 6).unwrap().value;
        assert_eq!((spacing.x, spacing.y), (4, 4));
    }

    #[test]
    fn test_single_frame_has_no_evidence() {
        let img = tile_sheet(1, 1, 32, 0, 0, 0, 0, 0);
        let detected = detect_spacing(&img, 32, 32, 0, 0).unwrap();
        assert_eq!((detected.value.x, detected.value.y), (0, 0));
        assert_eq!(detected.value.confidence(), SpacingConfidence::Low);
        assert!(detected.message.contains("confidence: low"));
    }

    #[test]
    fn test_zero_frame_rejected() {
        let img = RgbaImage::new(16, 16);
        assert!(matches!(
            detect_spacing(&img, 0, 16, 0, 0),
            Err(DetectError::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(SpacingConfidence::from_consistency(0.8), SpacingConfidence::High);
        assert_eq!(SpacingConfidence::from_consistency(0.5), SpacingConfidence::Medium);
        assert_eq!(SpacingConfidence::from_consistency(0.49), SpacingConfidence::Low);
    }
}
