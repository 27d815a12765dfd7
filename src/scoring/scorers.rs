//! The default scorer set.

use crate::config::{FrameRange, ScoringConfig};

use super::{FrameParameters, ScoreComponent, Scorer, ScoringError};

fn ensure_frame(params: &FrameParameters) -> Result<(), ScoringError> {
    if params.width == 0 || params.height == 0 {
        return Err(ScoringError::ZeroFrame);
    }
    Ok(())
}

fn joined(parts: Vec<String>, fallback: &str) -> String {
    if parts.is_empty() {
        fallback.to_string()
    } else {
        parts.join(", ")
    }
}

/// Rewards plausible frame counts.
pub struct FrameCountScorer {
    reasonable: FrameRange,
    optimal: FrameRange,
    excessive: u32,
}

impl FrameCountScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            reasonable: config.reasonable_frames,
            optimal: config.optimal_frames,
            excessive: config.excessive_frames,
        }
    }
}

impl Scorer for FrameCountScorer {
    fn name(&self) -> &'static str {
        "Frame Count"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        let count = params.frame_count;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if self.reasonable.contains(count) {
            score += 100.0;
            reasons.push("reasonable count".to_string());

            if self.optimal.contains(count) {
                score += 30.0;
                reasons.push("optimal range".to_string());
            }

            if count > self.excessive && !params.is_horizontal_strip {
                let penalty = ((count - self.excessive) * 2).min(50);
                score -= penalty as f64;
                reasons.push(format!("excessive count (-{})", penalty));
            }
        } else {
            reasons.push("out of range".to_string());
        }

        if params.is_horizontal_strip {
            if (8..=16).contains(&count) {
                score += 60.0;
                reasons.push("ideal animation count".to_string());
            } else if (6..=24).contains(&count) {
                score += 40.0;
                reasons.push("common animation count".to_string());
            } else if (4..=32).contains(&count) {
                score += 20.0;
                reasons.push("extended animation range".to_string());
            }
        }

        Ok(ScoreComponent::new(score, self.name(), joined(reasons, "no criteria met")))
    }
}

/// Rewards frames that line up with the available sheet area.
pub struct DimensionMatchScorer;

impl Scorer for DimensionMatchScorer {
    fn name(&self) -> &'static str {
        "Dimension Match"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        ensure_frame(params)?;
        let (aw, ah) = (params.available_width(), params.available_height());
        if aw == 0 || ah == 0 {
            return Err(ScoringError::NoAvailableArea);
        }

        let mut score = 0.0;
        let mut reasons = Vec::new();

        if params.width == aw || params.height == ah {
            score += 100.0;
            reasons.push("exact dimension match".to_string());
        } else if params.width == ah || params.height == aw {
            score += 80.0;
            reasons.push("swapped dimension match".to_string());
        }

        if aw % params.width == 0 && ah % params.height == 0 {
            score += 60.0;
            reasons.push("clean divisor".to_string());
        }

        Ok(ScoreComponent::new(score, self.name(), joined(reasons, "no dimension match")))
    }
}

/// Rewards sprite-sized frames.
pub struct SizeAppropriatenessScorer {
    min: u32,
    max: u32,
    common: Vec<u32>,
}

impl SizeAppropriatenessScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            min: config.min_size,
            max: config.max_size,
            common: config.common_sizes.clone(),
        }
    }
}

impl Scorer for SizeAppropriatenessScorer {
    fn name(&self) -> &'static str {
        "Size Appropriateness"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        let range = self.min..=self.max;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if range.contains(&params.width) && range.contains(&params.height) {
            score += 60.0;
            reasons.push("reasonable size".to_string());

            if params.width.is_power_of_two() && params.height.is_power_of_two() {
                score += 20.0;
                reasons.push("power-of-2".to_string());
            }

            if self.common.contains(&params.width) || self.common.contains(&params.height) {
                score += 30.0;
                reasons.push("common sprite size".to_string());
            }
        } else {
            reasons.push("size out of range".to_string());
        }

        Ok(ScoreComponent::new(score, self.name(), joined(reasons, "inappropriate size")))
    }
}

/// Rewards common reduced aspect ratios.
pub struct AspectRatioScorer {
    common: Vec<(u32, u32)>,
}

impl AspectRatioScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            common: config.common_ratios.clone(),
        }
    }
}

impl Scorer for AspectRatioScorer {
    fn name(&self) -> &'static str {
        "Aspect Ratio"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        ensure_frame(params)?;
        let (rw, rh) = params.aspect_ratio();

        let component = if self.common.contains(&(rw, rh)) {
            ScoreComponent::new(40.0, self.name(), format!("common ratio {}:{}", rw, rh))
        } else if rw == rh {
            ScoreComponent::new(25.0, self.name(), "square (1:1)")
        } else {
            ScoreComponent::new(0.0, self.name(), format!("uncommon ratio {}:{}", rw, rh))
        };

        Ok(component)
    }
}

/// Strip-aware grid shape scoring.
pub struct GridLayoutScorer;

impl Scorer for GridLayoutScorer {
    fn name(&self) -> &'static str {
        "Grid Layout"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        ensure_frame(params)?;
        let (cols, rows) = (params.cols(), params.rows());
        let mut score = 0.0;
        let mut reasons = Vec::new();

        if params.is_horizontal_strip {
            if rows == 1 {
                score += 60.0;
                reasons.push("single row strip".to_string());
            } else if rows <= 3 {
                score += 30.0;
                reasons.push("few rows".to_string());
            }
        } else {
            if (2..=8).contains(&cols) && (2..=8).contains(&rows) {
                score += 40.0;
                reasons.push(format!("good grid {}x{}", cols, rows));
            } else if cols >= 2 && rows >= 2 {
                score += 20.0;
                reasons.push(format!("minimal grid {}x{}", cols, rows));
            }

            if cols > 10 && rows > 10 {
                score -= 30.0;
                reasons.push("overly dense".to_string());
            }
        }

        Ok(ScoreComponent::new(score, self.name(), joined(reasons, "poor grid layout")))
    }
}

/// Up to 50 points, linear in area utilization.
pub struct SpaceUtilizationScorer;

impl Scorer for SpaceUtilizationScorer {
    fn name(&self) -> &'static str {
        "Space Utilization"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        if params.available_width() == 0 || params.available_height() == 0 {
            return Err(ScoringError::NoAvailableArea);
        }

        let utilization = params.utilization();
        let percent = (utilization * 100.0).round();
        let reason = if utilization >= 0.9 {
            format!("excellent ({}%)", percent)
        } else if utilization >= 0.7 {
            format!("good ({}%)", percent)
        } else if utilization >= 0.5 {
            format!("moderate ({}%)", percent)
        } else {
            format!("poor ({}%)", percent)
        };

        Ok(ScoreComponent::new(utilization * 50.0, self.name(), reason))
    }
}

/// Flat bonus for horizontal strips.
pub struct HorizontalStripScorer;

impl Scorer for HorizontalStripScorer {
    fn name(&self) -> &'static str {
        "Horizontal Strip"
    }

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
        if !params.is_horizontal_strip {
            return Ok(ScoreComponent::new(0.0, self.name(), "not a horizontal strip"));
        }

        let mut score = 80.0;
        let mut reasons = vec!["horizontal strip detected".to_string()];

        if params.width == params.height && params.height == params.available_height() {
            score += 30.0;
            reasons.push("square frames matching height".to_string());
        }

        Ok(ScoreComponent::new(score, self.name(), reasons.join(", ")))
    }
}
