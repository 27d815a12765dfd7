//! Modular frame-size scoring.
//!
//! A candidate `(width, height, frame_count)` is rated by a list of
//! independent [`Scorer`]s. The total is the sum of every component;
//! zero-score components are left out of the audit trail.

mod scorers;

use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::config::ScoringConfig;

pub use scorers::{
    AspectRatioScorer, DimensionMatchScorer, FrameCountScorer, GridLayoutScorer,
    HorizontalStripScorer, SizeAppropriatenessScorer, SpaceUtilizationScorer,
};

/// Failure inside a single scorer. Never fatal to the calculation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("frame has zero width or height")]
    ZeroFrame,
    #[error("no area available after offsets")]
    NoAvailableArea,
}

/// Candidate frame layout passed to every scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParameters {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub is_horizontal_strip: bool,
}

impl FrameParameters {
    pub fn new(width: u32, height: u32, frame_count: u32, sheet_width: u32, sheet_height: u32) -> Self {
        Self {
            width,
            height,
            frame_count,
            sheet_width,
            sheet_height,
            offset_x: 0,
            offset_y: 0,
            is_horizontal_strip: false,
        }
    }

    pub fn with_offset(mut self, offset_x: u32, offset_y: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn strip(mut self, is_horizontal_strip: bool) -> Self {
        self.is_horizontal_strip = is_horizontal_strip;
        self
    }

    pub fn available_width(&self) -> u32 {
        self.sheet_width.saturating_sub(self.offset_x)
    }

    pub fn available_height(&self) -> u32 {
        self.sheet_height.saturating_sub(self.offset_y)
    }

    pub fn cols(&self) -> u32 {
        if self.width == 0 {
            0
        } else {
            self.available_width() / self.width
        }
    }

    pub fn rows(&self) -> u32 {
        if self.height == 0 {
            0
        } else {
            self.available_height() / self.height
        }
    }

    /// Aspect ratio reduced by the GCD, `(0, 0)` for a degenerate frame.
    pub fn aspect_ratio(&self) -> (u32, u32) {
        let divisor = gcd(self.width, self.height);
        if divisor == 0 {
            (0, 0)
        } else {
            (self.width / divisor, self.height / divisor)
        }
    }

    /// Frame area over available area, clamped to 1.0.
    pub fn utilization(&self) -> f64 {
        let available = self.available_width() as f64 * self.available_height() as f64;
        if available <= 0.0 {
            return 0.0;
        }
        let frames = self.width as f64 * self.height as f64 * self.frame_count as f64;
        (frames / available).min(1.0)
    }

    /// Area of a single frame over available area.
    pub fn frame_utilization(&self) -> f64 {
        let available = self.available_width() as f64 * self.available_height() as f64;
        if available <= 0.0 {
            return 0.0;
        }
        (self.width as f64 * self.height as f64 / available).min(1.0)
    }
}

/// One scorer's contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComponent {
    pub score: f64,
    pub name: &'static str,
    pub reason: String,
}

impl ScoreComponent {
    pub fn new(score: f64, name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            score,
            name,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:+.1} ({})", self.name, self.score, self.reason)
    }
}

/// Summed score with per-component attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameScore {
    pub total_score: f64,
    pub components: Vec<ScoreComponent>,
    pub parameters: FrameParameters,
}

impl FrameScore {
    pub fn combine(components: Vec<ScoreComponent>, parameters: FrameParameters) -> Self {
        let total_score = components.iter().map(|c| c.score).sum();
        Self {
            total_score,
            components,
            parameters,
        }
    }

    /// Human-readable breakdown, one line per component.
    pub fn breakdown(&self) -> String {
        let mut lines = vec![format!("Total Score: {:.1}", self.total_score)];
        lines.push("-".repeat(40));
        lines.extend(self.components.iter().map(ToString::to_string));
        lines.join("\n")
    }
}

/// A single, independent scoring rule.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn calculate(&self, params: &FrameParameters) -> Result<ScoreComponent, ScoringError>;
}

/// Runs every registered scorer and sums the results.
pub struct FrameScoreCalculator {
    scorers: Vec<Box<dyn Scorer>>,
}

impl FrameScoreCalculator {
    /// Calculator with the default scorer set.
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            scorers: vec![
                Box::new(FrameCountScorer::new(config)),
                Box::new(DimensionMatchScorer),
                Box::new(SizeAppropriatenessScorer::new(config)),
                Box::new(AspectRatioScorer::new(config)),
                Box::new(GridLayoutScorer),
                Box::new(SpaceUtilizationScorer),
                Box::new(HorizontalStripScorer),
            ],
        }
    }

    /// Calculator with no scorers.
    pub fn empty() -> Self {
        Self { scorers: vec![] }
    }

    pub fn add_scorer(&mut self, scorer: Box<dyn Scorer>) {
        self.scorers.push(scorer);
    }

    pub fn remove_scorer(&mut self, name: &str) {
        self.scorers.retain(|s| s.name() != name);
    }

    pub fn scorer_names(&self) -> Vec<&'static str> {
        self.scorers.iter().map(|s| s.name()).collect()
    }

    pub fn calculate_score(&self, params: &FrameParameters) -> FrameScore {
        let mut components = Vec::with_capacity(self.scorers.len());

        for scorer in &self.scorers {
            match scorer.calculate(params) {
                Ok(component) if component.score != 0.0 => components.push(component),
                Ok(_) => {}
                Err(err) => {
                    warn!(scorer = scorer.name(), error = %err, "Scorer failed, contributing 0");
                }
            }
        }

        FrameScore::combine(components, *params)
    }
}

impl Default for FrameScoreCalculator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

pub(crate) fn gcd(a: u32, b: u32) -> u32 {
    let (mut a, mut b) = (a, b);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Scorer for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn calculate(&self, _params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
            Err(ScoringError::ZeroFrame)
        }
    }

    struct Fixed(f64);

    impl Scorer for Fixed {
        fn name(&self) -> &'static str {
            "Fixed"
        }

        fn calculate(&self, _params: &FrameParameters) -> Result<ScoreComponent, ScoringError> {
            Ok(ScoreComponent::new(self.0, "Fixed", "constant"))
        }
    }

    #[test]
    fn test_parameters_derived_values() {
        let params = FrameParameters::new(32, 48, 6, 100, 100).with_offset(4, 4);
        assert_eq!(params.available_width(), 96);
        assert_eq!(params.available_height(), 96);
        assert_eq!(params.cols(), 3);
        assert_eq!(params.rows(), 2);
        assert_eq!(params.aspect_ratio(), (2, 3));
        let expected = (32.0 * 48.0 * 6.0) / (96.0 * 96.0);
        assert!((params.utilization() - expected).abs() < 1e-9);
        let single = (32.0 * 48.0) / (96.0 * 96.0);
        assert!((params.frame_utilization() - single).abs() < 1e-9);
    }

    #[test]
    fn test_utilization_clamped() {
        let params = FrameParameters::new(64, 64, 10, 64, 64);
        assert_eq!(params.utilization(), 1.0);
    }

    #[test]
    fn test_degenerate_parameters() {
        let params = FrameParameters::new(0, 0, 0, 64, 64);
        assert_eq!(params.cols(), 0);
        assert_eq!(params.aspect_ratio(), (0, 0));
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let params = FrameParameters::new(32, 32, 16, 128, 128);
        let score = FrameScoreCalculator::default().calculate_score(&params);
        let sum: f64 = score.components.iter().map(|c| c.score).sum();
        assert_eq!(score.total_score, sum);
        assert!(score.components.iter().all(|c| c.score != 0.0));
    }

    #[test]
    fn test_failing_scorer_contributes_zero() {
        let params = FrameParameters::new(32, 32, 16, 128, 128);

        let mut calculator = FrameScoreCalculator::empty();
        calculator.add_scorer(Box::new(Fixed(12.5)));
        calculator.add_scorer(Box::new(Failing));

        let score = calculator.calculate_score(&params);
        assert_eq!(score.total_score, 12.5);
        assert_eq!(score.components.len(), 1);
    }

    #[test]
    fn test_zero_components_omitted() {
        let params = FrameParameters::new(32, 32, 16, 128, 128);

        let mut calculator = FrameScoreCalculator::empty();
        calculator.add_scorer(Box::new(Fixed(0.0)));

        let score = calculator.calculate_score(&params);
        assert!(score.components.is_empty());
        assert_eq!(score.total_score, 0.0);
    }

    #[test]
    fn test_remove_scorer() {
        let mut calculator = FrameScoreCalculator::default();
        calculator.remove_scorer("Horizontal Strip");
        assert!(!calculator.scorer_names().contains(&"Horizontal Strip"));
        assert_eq!(calculator.scorer_names().len(), 6);
    }

    #[test]
    fn test_breakdown_format() {
        let params = FrameParameters::new(32, 32, 16, 128, 128);
        let score = FrameScore::combine(
            vec![ScoreComponent::new(40.0, "Aspect Ratio", "common ratio 1:1")],
            params,
        );
        assert_eq!(
            score.breakdown(),
            format!(
                "Total Score: 40.0\n{}\nAspect Ratio: +40.0 (common ratio 1:1)",
                "-".repeat(40)
            )
        );
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(96, 160), 32);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(0, 0), 0);
    }
}
