//! pxdetect - Sprite sheet detection and segmentation
//!
//! Finds the frame size, margins and spacing of grid-based sprite sheets,
//! and the exact sprite rectangles of irregular ones, from pixels alone.

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod output;
pub mod sampler;
pub mod scoring;
pub mod segment;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{DetectionConfig, FrameRange};
pub use detect::{
    comprehensive_auto_detect, cross_validate, detect_background_color, detect_color_key,
    detect_content_based, detect_frame_size, detect_margins, detect_rectangular_frames,
    detect_spacing, ColorKey, ConfidenceLevel, DetectionCoordinator, DetectionResult,
    DetectionStatus, FrameStrategy,
};
pub use error::{DetectError, Result};
pub use extract::{extract_frames, extract_sprites, write_frames, write_frames_json, ExtractedFrame};
pub use sampler::Sampler;
pub use scoring::{FrameParameters, FrameScore, FrameScoreCalculator, ScoreComponent, Scorer};
pub use segment::{segment_ccl, SegmentationOutcome, Segmenter};
pub use types::{Detected, FrameLayout, Rect};
