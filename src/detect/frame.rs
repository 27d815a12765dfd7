//! Frame-size detection.
//!
//! Three strategies of increasing sophistication. Each works on the
//! area right of and below the configured offset, so a detector built
//! with [`FrameDetector::with_offset`] ignores the sheet margins.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::error::{DetectError, Result};
use crate::sampler::{ensure_image, Sampler};
use crate::scoring::{gcd, FrameParameters, FrameScore, FrameScoreCalculator};
use crate::types::{Detected, Rect};

/// Scores closer than this are treated as equal.
const SCORE_EPSILON: f64 = 1e-9;
/// Utilization difference needed to break a score tie.
const UTILIZATION_MARGIN: f64 = 0.1;

/// Which algorithm produced a frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStrategy {
    Ccl,
    ContentBased,
    Rectangular,
    Basic,
}

impl FrameStrategy {
    /// Fixed confidence a successful run of this strategy contributes.
    pub fn confidence(&self) -> f64 {
        match self {
            FrameStrategy::Ccl => 0.98,
            FrameStrategy::ContentBased => 0.95,
            FrameStrategy::Rectangular => 0.8,
            FrameStrategy::Basic => 0.6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FrameStrategy::Ccl => "CCL",
            FrameStrategy::ContentBased => "content-based",
            FrameStrategy::Rectangular => "rectangular",
            FrameStrategy::Basic => "basic",
        }
    }
}

/// A detected frame size.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
    /// Winning score, kept by the rectangular strategy.
    pub score: Option<FrameScore>,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            score: None,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

pub struct FrameDetector<'a> {
    config: &'a DetectionConfig,
    calculator: FrameScoreCalculator,
    offset_x: u32,
    offset_y: u32,
}

impl<'a> FrameDetector<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self {
            config,
            calculator: FrameScoreCalculator::new(&config.scoring),
            offset_x: 0,
            offset_y: 0,
        }
    }

    /// Restrict detection to the area after the given margins.
    pub fn with_offset(mut self, offset_x: u32, offset_y: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// Replace the scorer set used by rectangular detection.
    pub fn with_calculator(mut self, calculator: FrameScoreCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    fn available<S: Sampler + ?Sized>(&self, image: &S) -> Result<(u32, u32)> {
        ensure_image(image)?;
        let width = image.width().saturating_sub(self.offset_x);
        let height = image.height().saturating_sub(self.offset_y);
        if width == 0 || height == 0 {
            return Err(DetectError::frame_size(
                width,
                height,
                "no area available after offsets",
            ));
        }
        Ok((width, height))
    }

    fn is_strip(&self, width: u32, height: u32) -> bool {
        width as f64 / height as f64 > self.config.margins.strip_ratio
    }

    /// Square frames: first common size that tiles the area, else the GCD.
    pub fn detect_basic<S: Sampler + ?Sized>(&self, image: &S) -> Result<Detected<FrameSize>> {
        let (width, height) = self.available(image)?;
        let frames = &self.config.frames;

        for &size in &frames.common_sizes {
            if size == 0 || size > width || size > height {
                continue;
            }
            if width % size == 0 && height % size == 0 {
                let total = (width / size) * (height / size);
                if frames.frame_range.contains(total) {
                    debug!(size, total, "Common size tiles sheet");
                    return Ok(Detected::new(
                        FrameSize::new(size, size),
                        format!("Auto-detected frame size: {}x{}", size, size),
                    ));
                }
            }
        }

        let size = gcd(width, height);
        if size >= frames.min_sprite_size && size <= frames.max_frame_size {
            return Ok(Detected::new(
                FrameSize::new(size, size),
                format!("Auto-detected frame size: {}x{} (gcd)", size, size),
            ));
        }

        Err(DetectError::frame_size(
            size,
            size,
            format!(
                "could not auto-detect suitable frame size for {}x{}",
                width, height
            ),
        ))
    }

    fn strip_candidates(&self, width: u32, height: u32, out: &mut Vec<(u32, u32)>) {
        let frames = &self.config.frames;

        for n in 2..=frames.max_divisions {
            if width % n == 0 {
                let frame_w = width / n;
                if (16..=512).contains(&frame_w) {
                    out.push((frame_w, height));
                }
            }
        }

        for &frame_w in &frames.strip_widths {
            if frame_w > 0 && width / frame_w >= 2 {
                out.push((frame_w, height));
            }
        }
    }

    fn grid_candidates(&self, width: u32, height: u32, out: &mut Vec<(u32, u32)>) {
        let frames = &self.config.frames;
        let reasonable = self.config.scoring.reasonable_frames;
        let min_size = self.config.scoring.min_size.max(1);

        for &base in &frames.base_sizes {
            for &(ratio_w, ratio_h) in &frames.aspect_ratios {
                let (frame_w, frame_h) = (base * ratio_w, base * ratio_h);
                if frame_w == 0 || frame_h == 0 || frame_w > width || frame_h > height {
                    continue;
                }
                if width % frame_w == 0 && height % frame_h == 0 {
                    let total = (width / frame_w) * (height / frame_h);
                    if reasonable.contains(total) {
                        out.push((frame_w, frame_h));
                    }
                }
            }
        }

        let divisors = |dimension: u32| -> Vec<u32> {
            let mut sizes: Vec<u32> = (2..=frames.max_divisions)
                .filter(|n| dimension % n == 0)
                .map(|n| dimension / n)
                .chain(std::iter::once(dimension))
                .filter(|&size| size >= min_size)
                .collect();
            sizes.dedup();
            sizes
        };

        let widths = divisors(width);
        let heights = divisors(height);
        for &frame_w in &widths {
            for &frame_h in &heights {
                let total = (width / frame_w) * (height / frame_h);
                if reasonable.contains(total) {
                    out.push((frame_w, frame_h));
                }
            }
        }
    }

    /// True when `candidate` should replace `best` on an equal score.
    fn breaks_tie(&self, candidate: &FrameScore, best: &FrameScore) -> bool {
        let (cu, bu) = (
            candidate.parameters.frame_utilization(),
            best.parameters.frame_utilization(),
        );
        if (cu - bu).abs() > UTILIZATION_MARGIN {
            return cu > bu;
        }

        let standard = |p: &FrameParameters| {
            let sizes = &self.config.frames.standard_sizes;
            sizes.contains(&p.width) && sizes.contains(&p.height)
        };
        let (cs, bs) = (standard(&candidate.parameters), standard(&best.parameters));
        if cs != bs {
            return cs > bs;
        }

        let squareness = |p: &FrameParameters| {
            let (lo, hi) = (p.width.min(p.height), p.width.max(p.height));
            hi as f64 / lo.max(1) as f64
        };
        squareness(&candidate.parameters) < squareness(&best.parameters)
    }

    /// Scored search over rectangular candidates, strip-aware.
    pub fn detect_rectangular<S: Sampler + ?Sized>(
        &self,
        image: &S,
    ) -> Result<Detected<FrameSize>> {
        let (width, height) = self.available(image)?;
        let strip = self.is_strip(width, height);
        let max = self.config.frames.max_frame_size;

        let mut candidates = Vec::new();
        if strip {
            self.strip_candidates(width, height, &mut candidates);
        }
        self.grid_candidates(width, height, &mut candidates);

        let mut seen = HashSet::new();
        candidates.retain(|&(w, h)| w <= max && h <= max && seen.insert((w, h)));

        let mut best: Option<FrameScore> = None;
        for &(frame_w, frame_h) in &candidates {
            let total = (width / frame_w) * (height / frame_h);
            let params = FrameParameters::new(
                frame_w,
                frame_h,
                total,
                image.width(),
                image.height(),
            )
            .with_offset(self.offset_x, self.offset_y)
            .strip(strip);
            let score = self.calculator.calculate_score(&params);

            let replace = match &best {
                None => true,
                Some(current) => {
                    let delta = score.total_score - current.total_score;
                    delta > SCORE_EPSILON
                        || (delta.abs() <= SCORE_EPSILON && self.breaks_tie(&score, current))
                }
            };
            if replace {
                best = Some(score);
            }
        }

        let Some(best) = best else {
            return Err(DetectError::frame_size(
                width,
                height,
                "no valid rectangular frame sizes found",
            ));
        };

        let params = best.parameters;
        info!(
            width = params.width,
            height = params.height,
            score = best.total_score,
            candidates = candidates.len(),
            strip,
            "Rectangular frame size selected"
        );
        let message = format!(
            "Detected rectangular frames: {}x{} ({}x{} = {} frames, score: {:.1})",
            params.width,
            params.height,
            params.cols(),
            params.rows(),
            params.frame_count,
            best.total_score
        );

        Ok(Detected::new(
            FrameSize {
                width: params.width,
                height: params.height,
                score: Some(best),
            },
            message,
        ))
    }

    fn region_has_content<S: Sampler + ?Sized>(&self, image: &S, cell: Rect) -> bool {
        let step = (cell.width.min(cell.height) / 4).max(1) as usize;
        let x_end = cell.right().min(image.width());
        let y_end = cell.bottom().min(image.height());

        (cell.y..y_end).step_by(step).any(|y| {
            (cell.x..x_end)
                .step_by(step)
                .any(|x| image.is_solid(x, y, self.config.alpha_threshold))
        })
    }

    /// Most frequent size among grid cells that hold content.
    pub fn detect_content_based<S: Sampler + ?Sized>(
        &self,
        image: &S,
    ) -> Result<Detected<FrameSize>> {
        let (width, height) = self.available(image)?;

        let frames = &self.config.frames;
        let mut tiled = false;
        let mut bounds = Vec::new();
        for &size in &frames.content_grid_sizes {
            if size == 0 || width % size != 0 || height % size != 0 {
                continue;
            }
            // Grids that could never pass cross-validation don't vote.
            let cells = (width / size) * (height / size);
            if !frames.frame_range.contains(cells) {
                debug!(size, cells, "Content grid outside frame window");
                continue;
            }
            tiled = true;

            for row in 0..height / size {
                for col in 0..width / size {
                    let cell = Rect::new(
                        self.offset_x + col * size,
                        self.offset_y + row * size,
                        size,
                        size,
                    );
                    if self.region_has_content(image, cell) {
                        bounds.push(cell);
                    }
                }
            }
        }

        if bounds.is_empty() {
            let message = if tiled {
                "every sampled cell is transparent"
            } else {
                "no candidate grid size tiles the sheet"
            };
            return Err(DetectError::no_content(message));
        }

        // Ties go to the size seen first.
        let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
        let mut order = Vec::new();
        for rect in &bounds {
            let entry = counts.entry(rect.size()).or_insert(0);
            if *entry == 0 {
                order.push(rect.size());
            }
            *entry += 1;
        }
        let mut best = order[0];
        for size in &order[1..] {
            if counts[size] > counts[&best] {
                best = *size;
            }
        }

        let count = counts[&best];
        debug!(cells = bounds.len(), ?best, count, "Content cells collected");
        Ok(Detected::new(
            FrameSize::new(best.0, best.1),
            format!(
                "Content-based detection: {}x{} (found {} sprites with these dimensions)",
                best.0, best.1, count
            ),
        ))
    }
}

/// Basic square detection with the default configuration.
pub fn detect_frame_size<S: Sampler + ?Sized>(image: &S) -> Result<Detected<FrameSize>> {
    let config = DetectionConfig::default();
    FrameDetector::new(&config).detect_basic(image)
}

/// Scored rectangular detection with the default configuration.
pub fn detect_rectangular_frames<S: Sampler + ?Sized>(image: &S) -> Result<Detected<FrameSize>> {
    let config = DetectionConfig::default();
    FrameDetector::new(&config).detect_rectangular(image)
}

/// Content-based detection with the default configuration.
pub fn detect_content_based<S: Sampler + ?Sized>(image: &S) -> Result<Detected<FrameSize>> {
    let config = DetectionConfig::default();
    FrameDetector::new(&config).detect_content_based(image)
}
