//! One-call detection: margins, frame size, spacing, cross-validation.
//!
//! The coordinator never fails. Every step contributes a fixed
//! confidence for its outcome and a line to the trace; the overall
//! confidence is the mean of the step confidences.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{DetectionConfig, FrameRange};
use crate::error::{DetectError, Result};
use crate::sampler::{ensure_image, Sampler};
use crate::output::plural;
use crate::segment::{LayoutMethod, SegmentationOutcome, Segmenter};
use crate::types::{Detected, FrameLayout, Rect};

use super::frame::{FrameDetector, FrameSize, FrameStrategy};
use super::margin::MarginDetector;
use super::spacing::{SpacingConfidence, SpacingDetector};

const MARGIN_OK: f64 = 0.9;
const MARGIN_FAILED: f64 = 0.3;
const IRREGULAR_SEGMENTATION: f64 = 0.7;
/// Sprites a non-grid segmentation needs before it can size frames.
const MIN_FALLBACK_SPRITES: usize = 4;
const ALL_FRAMES_FAILED: f64 = 0.1;
const SPACING_FAILED: f64 = 0.3;
const SPACING_SKIPPED: f64 = 0.1;
const VALIDATION_OK: f64 = 0.8;
const VALIDATION_FAILED: f64 = 0.4;

/// Success threshold for the overall confidence.
const SUCCESS: f64 = 0.6;
/// Below this the run is a failure.
const WARNING: f64 = 0.4;

/// Confidence bucket shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Failed,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= SUCCESS {
            ConfidenceLevel::Medium
        } else if score >= WARNING {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::Failed
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Success,
    SuccessWithWarnings,
    #[default]
    Failed,
}

/// Everything one detection run found.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DetectionResult {
    pub success: bool,
    pub status: DetectionStatus,
    pub frame_width: u32,
    pub frame_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub spacing_x: u32,
    pub spacing_y: u32,
    confidence: f64,
    /// Frame-size strategy that produced the frame size.
    pub strategy: Option<FrameStrategy>,
    pub irregular: bool,
    /// Exact sprite rectangles from segmentation, when it ran.
    pub sprite_bounds: Vec<Rect>,
    /// Frame count implied by the layout, when it validated.
    pub frame_count: Option<u32>,
    pub messages: Vec<String>,
}

impl DetectionResult {
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Store a confidence, clamped to `[0.0, 1.0]`.
    pub fn set_confidence(&mut self, value: f64) {
        self.confidence = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence)
    }

    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.frame_width, self.frame_height)
            .with_offset(self.offset_x, self.offset_y)
            .with_spacing(self.spacing_x, self.spacing_y)
    }

    /// Rectangles to extract: exact sprite bounds for irregular sheets,
    /// grid cells otherwise.
    pub fn frame_rects(&self, sheet_width: u32, sheet_height: u32) -> Vec<Rect> {
        if self.irregular && !self.sprite_bounds.is_empty() {
            self.sprite_bounds.clone()
        } else {
            self.layout().frame_rects(sheet_width, sheet_height)
        }
    }

    /// One-line outcome.
    pub fn summary(&self) -> String {
        let percent = self.confidence * 100.0;
        match self.status {
            DetectionStatus::Failed => {
                format!("Auto-detection failed ({:.0}% confidence)", percent)
            }
            status => {
                let layout = if self.irregular {
                    format!(
                        "{} irregular sprites (typical {}x{})",
                        self.sprite_bounds.len(),
                        self.frame_width,
                        self.frame_height
                    )
                } else {
                    format!(
                        "{}x{} frames, offset {},{}, spacing {},{}",
                        self.frame_width,
                        self.frame_height,
                        self.offset_x,
                        self.offset_y,
                        self.spacing_x,
                        self.spacing_y
                    )
                };
                let suffix = if status == DetectionStatus::SuccessWithWarnings {
                    ", with warnings"
                } else {
                    ""
                };
                format!(
                    "{} ({} confidence, {:.0}%{})",
                    layout,
                    self.confidence_level(),
                    percent,
                    suffix
                )
            }
        }
    }

    /// Full diagnostic trace.
    pub fn report(&self) -> String {
        self.messages.join("\n")
    }
}

/// Check that a layout tiles the sheet with a frame count inside `range`.
pub fn validate_layout(
    sheet_width: u32,
    sheet_height: u32,
    layout: &FrameLayout,
    range: FrameRange,
) -> Result<Detected<u32>> {
    if layout.width == 0 || layout.height == 0 {
        return Err(DetectError::frame_size(
            layout.width,
            layout.height,
            "invalid frame dimensions detected",
        ));
    }
    if layout.offset_x + layout.width > sheet_width {
        return Err(DetectError::frame_size(
            layout.width,
            layout.height,
            format!(
                "frame width + margin ({}) exceeds sheet width ({})",
                layout.offset_x + layout.width,
                sheet_width
            ),
        ));
    }
    if layout.offset_y + layout.height > sheet_height {
        return Err(DetectError::frame_size(
            layout.width,
            layout.height,
            format!(
                "frame height + margin ({}) exceeds sheet height ({})",
                layout.offset_y + layout.height,
                sheet_height
            ),
        ));
    }

    let (cols, rows) = layout.grid_size(sheet_width, sheet_height);
    let frames = cols * rows;
    if !range.contains(frames) {
        return Err(DetectError::OutOfRange {
            frames,
            min: range.min,
            max: range.max,
        });
    }

    Ok(Detected::new(
        frames,
        format!("Validation passed: {}x{} = {} frames", cols, rows, frames),
    ))
}

/// Cross-validate a layout with the default frame-count window.
pub fn cross_validate(
    sheet_width: u32,
    sheet_height: u32,
    layout: &FrameLayout,
) -> Result<Detected<u32>> {
    validate_layout(
        sheet_width,
        sheet_height,
        layout,
        DetectionConfig::default().frames.frame_range,
    )
}

/// Running state of one detection.
struct Run {
    result: DetectionResult,
    trace: Vec<String>,
    scores: Vec<f64>,
    frames_failed: bool,
}

impl Run {
    fn step(&mut self, title: &str) {
        if !self.trace.is_empty() {
            self.trace.push(String::new());
        }
        self.trace.push(title.to_string());
    }

    fn ok(&mut self, line: impl fmt::Display) {
        self.trace.push(format!("  ✓ {}", line));
    }

    fn warn(&mut self, line: impl fmt::Display) {
        self.trace.push(format!("  ⚠ {}", line));
    }

    fn note(&mut self, line: impl fmt::Display) {
        self.trace.push(format!("    {}", line));
    }
}

pub struct DetectionCoordinator<'a> {
    config: &'a DetectionConfig,
}

impl<'a> DetectionCoordinator<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Run every step on `image`. `path` only labels the trace.
    pub fn detect<S: Sampler + ?Sized>(&self, image: &S, path: Option<&Path>) -> DetectionResult {
        let mut run = Run {
            result: DetectionResult::default(),
            trace: Vec::new(),
            scores: Vec::new(),
            frames_failed: false,
        };

        if let Some(path) = path {
            run.trace.push(format!("Sheet: {}", path.display()));
        }
        if let Err(err) = ensure_image(image) {
            run.trace.push(err.to_string());
            run.result.messages = run.trace;
            return run.result;
        }

        self.margins(image, &mut run);
        let segmented = self.frame_size(image, &mut run);
        self.spacing(image, segmented, &mut run);
        self.cross_validate(image, &mut run);
        self.finish(run)
    }

    fn margins<S: Sampler + ?Sized>(&self, image: &S, run: &mut Run) {
        run.step("Step 1: Detecting margins");
        match MarginDetector::new(self.config).detect(image, None, None) {
            Ok(detected) => {
                run.result.offset_x = detected.value.offset_x;
                run.result.offset_y = detected.value.offset_y;
                run.ok(&detected.message);
                run.scores.push(MARGIN_OK);
            }
            Err(err) => {
                run.warn(format!("Margin detection failed: {}", err));
                run.note("Using default margins (0, 0)");
                run.scores.push(MARGIN_FAILED);
            }
        }
    }

    /// Returns true when segmentation supplied the layout.
    fn frame_size<S: Sampler + ?Sized>(&self, image: &S, run: &mut Run) -> bool {
        run.step("Step 2: Detecting frame size");

        let min = self.config.segmentation.min_component;
        if image.width() >= min && image.height() >= min {
            match Segmenter::new(self.config).segment(image, None) {
                Ok(outcome) if !sizes_frames(&outcome) => {
                    for line in &outcome.messages {
                        run.note(line);
                    }
                    run.warn(format!(
                        "CCL segmentation found {} and no grid; too few to size frames",
                        plural(outcome.sprite_count(), "sprite", "sprites")
                    ));
                    run.note("Falling back to content-based detection");
                }
                Ok(outcome) => {
                    for line in &outcome.messages {
                        run.note(line);
                    }
                    if run.result.offset_x != 0 || run.result.offset_y != 0 {
                        run.warn(format!(
                            "Discarding detected margins ({}, {}); segmented frames start at the sheet origin",
                            run.result.offset_x, run.result.offset_y
                        ));
                    }
                    run.ok(format!(
                        "CCL segmentation: {}x{} ({}, {} sprites, {} confidence)",
                        outcome.frame_width,
                        outcome.frame_height,
                        outcome.method,
                        outcome.sprite_count(),
                        outcome.confidence
                    ));

                    let result = &mut run.result;
                    result.frame_width = outcome.frame_width;
                    result.frame_height = outcome.frame_height;
                    result.offset_x = outcome.offset_x;
                    result.offset_y = outcome.offset_y;
                    result.spacing_x = outcome.spacing_x;
                    result.spacing_y = outcome.spacing_y;
                    result.irregular = outcome.irregular;
                    result.sprite_bounds = outcome.sprite_bounds;
                    result.strategy = Some(FrameStrategy::Ccl);

                    run.scores.push(if outcome.irregular {
                        IRREGULAR_SEGMENTATION
                    } else {
                        FrameStrategy::Ccl.confidence()
                    });
                    return true;
                }
                Err(err) => {
                    run.warn(format!("CCL segmentation failed: {}", err));
                    run.note("Falling back to content-based detection");
                }
            }
        }

        let detector = FrameDetector::new(self.config)
            .with_offset(run.result.offset_x, run.result.offset_y);
        let strategies = [
            FrameStrategy::ContentBased,
            FrameStrategy::Rectangular,
            FrameStrategy::Basic,
        ];

        for (i, strategy) in strategies.iter().enumerate() {
            let attempt: Result<Detected<FrameSize>> = match strategy {
                FrameStrategy::ContentBased => detector.detect_content_based(image),
                FrameStrategy::Rectangular => detector.detect_rectangular(image),
                _ => detector.detect_basic(image),
            };

            match attempt {
                Ok(detected) => {
                    run.ok(&detected.message);
                    if let Some(score) = &detected.value.score {
                        for line in score.breakdown().lines() {
                            run.note(line);
                        }
                    }
                    run.result.frame_width = detected.value.width;
                    run.result.frame_height = detected.value.height;
                    run.result.strategy = Some(*strategy);
                    run.scores.push(strategy.confidence());
                    return false;
                }
                Err(err) => {
                    run.warn(format!("{} detection failed: {}", strategy.label(), err));
                    if let Some(next) = strategies.get(i + 1) {
                        run.note(format!("Falling back to {} detection", next.label()));
                    }
                }
            }
        }

        warn!("Every frame-size strategy failed");
        run.trace.push("  ✗ All frame detection failed".to_string());
        run.scores.push(ALL_FRAMES_FAILED);
        run.frames_failed = true;
        false
    }

    fn spacing<S: Sampler + ?Sized>(&self, image: &S, segmented: bool, run: &mut Run) {
        if segmented {
            run.step("Step 3: Spacing taken from segmentation");
            return;
        }

        let layout = run.result.layout();
        if layout.width == 0 || layout.height == 0 {
            run.step("Step 3: Skipped spacing detection (no valid frame size)");
            run.scores.push(SPACING_SKIPPED);
            return;
        }

        run.step("Step 3: Detecting frame spacing");
        let attempt = SpacingDetector::new(self.config).detect(
            image,
            layout.width,
            layout.height,
            layout.offset_x,
            layout.offset_y,
        );
        match attempt {
            Ok(detected) => {
                run.result.spacing_x = detected.value.x;
                run.result.spacing_y = detected.value.y;
                run.ok(&detected.message);
                run.scores.push(match detected.value.confidence() {
                    SpacingConfidence::High => 0.9,
                    SpacingConfidence::Medium => 0.7,
                    SpacingConfidence::Low => 0.5,
                });
            }
            Err(err) => {
                run.warn(format!("Spacing detection failed: {}", err));
                run.note("Using default spacing (0, 0)");
                run.result.spacing_x = 0;
                run.result.spacing_y = 0;
                run.scores.push(SPACING_FAILED);
            }
        }
    }

    fn cross_validate<S: Sampler + ?Sized>(&self, image: &S, run: &mut Run) {
        run.step("Step 4: Cross-validation");
        let layout = run.result.layout();
        match validate_layout(
            image.width(),
            image.height(),
            &layout,
            self.config.frames.frame_range,
        ) {
            Ok(detected) => {
                run.result.frame_count = Some(detected.value);
                run.ok(&detected.message);
                run.scores.push(VALIDATION_OK);
            }
            Err(err) => {
                run.warn(err);
                run.scores.push(VALIDATION_FAILED);
            }
        }
    }

    fn finish(&self, mut run: Run) -> DetectionResult {
        let mean = if run.scores.is_empty() {
            0.0
        } else {
            run.scores.iter().sum::<f64>() / run.scores.len() as f64
        };
        run.result.set_confidence(mean);
        let confidence = run.result.confidence();

        run.result.status = if !run.frames_failed && confidence >= SUCCESS {
            DetectionStatus::Success
        } else if confidence >= WARNING {
            DetectionStatus::SuccessWithWarnings
        } else {
            DetectionStatus::Failed
        };
        run.result.success = run.result.status != DetectionStatus::Failed;

        let r = &run.result;
        let overall = vec![
            String::new(),
            "Overall Result:".to_string(),
            format!("  Frame Size: {}x{}", r.frame_width, r.frame_height),
            format!("  Margins: X={}, Y={}", r.offset_x, r.offset_y),
            format!("  Spacing: X={}, Y={}", r.spacing_x, r.spacing_y),
            format!(
                "  Confidence: {} ({:.1}%)",
                r.confidence_level(),
                confidence * 100.0
            ),
            match r.status {
                DetectionStatus::Success => "  Auto-detection completed successfully",
                DetectionStatus::SuccessWithWarnings => "  Auto-detection completed with warnings",
                DetectionStatus::Failed => "  Auto-detection completed with low confidence",
            }
            .to_string(),
        ];
        run.trace.extend(overall);

        info!(
            frame_width = r.frame_width,
            frame_height = r.frame_height,
            confidence,
            status = ?r.status,
            "Detection finished"
        );

        run.result.messages = run.trace;
        run.result
    }
}

/// Whether a segmentation carries enough structure to set the frame size.
fn sizes_frames(outcome: &SegmentationOutcome) -> bool {
    matches!(outcome.method, LayoutMethod::Grid { .. })
        || outcome.sprite_count() >= MIN_FALLBACK_SPRITES
}

/// Detect everything with the default configuration.
pub fn comprehensive_auto_detect<S: Sampler + ?Sized>(
    image: &S,
    path: Option<&Path>,
) -> DetectionResult {
    let config = DetectionConfig::default();
    DetectionCoordinator::new(&config).detect(image, path)
}
