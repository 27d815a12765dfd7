//! Detection configuration (pxdetect.yaml) parsing.
//!
//! Every tunable threshold used by the detectors lives here. The defaults
//! are the values the detectors were tuned against; a project can override
//! any subset of them from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE: &str = "pxdetect.yaml";

/// Inclusive frame-count window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub min: u32,
    pub max: u32,
}

impl FrameRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: u32) -> bool {
        self.min <= count && count <= self.max
    }
}

/// Complete detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pixels with alpha at or below this value count as transparent.
    pub alpha_threshold: u8,
    pub margins: MarginConfig,
    pub frames: FrameConfig,
    pub scoring: ScoringConfig,
    pub spacing: SpacingConfig,
    pub background: BackgroundConfig,
    pub segmentation: SegmentationConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            alpha_threshold: 10,
            margins: MarginConfig::default(),
            frames: FrameConfig::default(),
            scoring: ScoringConfig::default(),
            spacing: SpacingConfig::default(),
            background: BackgroundConfig::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    /// Margins above this fraction of the dimension are reset to 0.
    pub max_fraction: f64,
    /// Width:height ratio above which a sheet is a horizontal strip.
    pub strip_ratio: f64,
    /// Offset cap applied to horizontal strips.
    pub strip_cap: u32,
    /// Offsets at or below this are snapped to 0.
    pub noise: u32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            max_fraction: 0.25,
            strip_ratio: 3.0,
            strip_cap: 5,
            noise: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Square sizes tried by the basic strategy, largest first.
    pub common_sizes: Vec<u32>,
    /// Smallest GCD accepted as a square frame.
    pub min_sprite_size: u32,
    /// Frame-count window for basic detection and cross-validation.
    pub frame_range: FrameRange,
    /// Base sizes multiplied by each aspect ratio.
    pub base_sizes: Vec<u32>,
    pub aspect_ratios: Vec<(u32, u32)>,
    /// Divisor counts tried against each available dimension.
    pub max_divisions: u32,
    /// Fixed widths tried for horizontal strips.
    pub strip_widths: Vec<u32>,
    /// Sizes counted as "standard" when breaking score ties.
    pub standard_sizes: Vec<u32>,
    /// Cell sizes sampled by content-based detection.
    pub content_grid_sizes: Vec<u32>,
    /// Largest frame dimension accepted anywhere.
    pub max_frame_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            common_sizes: vec![256, 192, 128, 64, 32, 16],
            min_sprite_size: 16,
            frame_range: FrameRange::new(1, 100),
            base_sizes: vec![8, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256],
            aspect_ratios: vec![(1, 1), (1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)],
            max_divisions: 20,
            strip_widths: vec![16, 24, 32, 48, 64, 96, 128, 160, 192, 256],
            standard_sizes: vec![16, 24, 32, 48, 64, 96, 128],
            content_grid_sizes: vec![16, 24, 32, 48, 64],
            max_frame_size: 2048,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub reasonable_frames: FrameRange,
    pub optimal_frames: FrameRange,
    /// Frame counts above this are penalised on non-strip sheets.
    pub excessive_frames: u32,
    pub common_sizes: Vec<u32>,
    pub common_ratios: Vec<(u32, u32)>,
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            reasonable_frames: FrameRange::new(2, 200),
            optimal_frames: FrameRange::new(4, 100),
            excessive_frames: 50,
            common_sizes: vec![16, 24, 32, 48, 64, 96, 128, 160, 192, 256],
            common_ratios: vec![(1, 1), (1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)],
            min_size: 8,
            max_size: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Largest gap tested, in pixels.
    pub max_spacing: u32,
    /// Gap positions probed per candidate.
    pub positions: u32,
    /// Stride used when sampling gap strips and frame evidence.
    pub sample_step: u32,
    /// Extent of the evidence probe past each gap.
    pub evidence_span: u32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            max_spacing: 10,
            positions: 3,
            sample_step: 5,
            evidence_span: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Opaque fraction at or above which alpha is uninformative.
    pub opaque_ratio: f64,
    /// Alpha above this is opaque for the opaque-fraction gate.
    pub opaque_alpha: u8,
    pub tolerances: Vec<u8>,
    /// Background coverage (percent) a tolerance must exceed.
    pub min_coverage: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            opaque_ratio: 0.95,
            opaque_alpha: 128,
            tolerances: vec![15, 25, 35, 50],
            min_coverage: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Alpha above this is foreground.
    pub mask_alpha: u8,
    /// Components narrower or shorter than this are discarded.
    pub min_component: u32,
    /// Center distance under which components merge.
    pub merge_distance: f64,
    /// Padding added to each box before the overlap test.
    pub merge_padding: u32,
    /// Tolerance used when grouping centers into rows/columns.
    pub group_tolerance: u32,
    /// Size std-dev under which a set is uniform enough for grid inference.
    pub uniform_std: f64,
    pub irregular_count: usize,
    pub irregular_std: f64,
    pub irregular_ratio: f64,
    pub small_size: u32,
    pub small_count: usize,
    /// Minimum share of components the mode size must cover.
    pub mode_floor: f64,
    /// Mode/median distance within which the mode is preferred.
    pub median_proximity: u32,
    /// Y-range (fraction of mean height) under which centers form one row.
    pub strip_row_fraction: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            mask_alpha: 128,
            min_component: 8,
            merge_distance: 15.0,
            merge_padding: 1,
            group_tolerance: 15,
            uniform_std: 8.0,
            irregular_count: 50,
            irregular_std: 10.0,
            irregular_ratio: 3.0,
            small_size: 24,
            small_count: 20,
            mode_floor: 0.02,
            median_proximity: 10,
            strip_row_fraction: 0.4,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DetectError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| DetectError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILE)),
        })
    }

    /// Resolve the config for a run: an explicit path, else `pxdetect.yaml`
    /// in `dir` when present, else defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate: PathBuf = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_empty_is_default() {
        let config = DetectionConfig::parse("{}").unwrap();
        assert_eq!(config, DetectionConfig::default());
    }

    #[test]
    fn test_parse_partial_override() {
        let yaml = r#"
alpha_threshold: 20
frames:
  common_sizes: [64, 32]
segmentation:
  merge_distance: 4.0
"#;
        let config = DetectionConfig::parse(yaml).unwrap();
        assert_eq!(config.alpha_threshold, 20);
        assert_eq!(config.frames.common_sizes, vec![64, 32]);
        assert_eq!(config.frames.min_sprite_size, 16);
        assert_eq!(config.segmentation.merge_distance, 4.0);
        assert_eq!(config.segmentation.min_component, 8);
    }

    #[test]
    fn test_parse_invalid() {
        let result = DetectionConfig::parse("alpha_threshold: [not, a, number]");
        assert!(matches!(result, Err(DetectError::Parse { .. })));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "alpha_threshold: 42\n").unwrap();

        let config = DetectionConfig::resolve(Some(&path), dir.path()).unwrap();
        assert_eq!(config.alpha_threshold, 42);
    }

    #[test]
    fn test_resolve_finds_default_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "spacing:\n  max_spacing: 4\n").unwrap();

        let config = DetectionConfig::resolve(None, dir.path()).unwrap();
        assert_eq!(config.spacing.max_spacing, 4);
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = DetectionConfig::resolve(None, dir.path()).unwrap();
        assert_eq!(config, DetectionConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = DetectionConfig::load(Path::new("/nonexistent/pxdetect.yaml"));
        assert!(matches!(result, Err(DetectError::Io { .. })));
    }

    #[test]
    fn test_frame_range_contains() {
        let range = FrameRange::new(1, 100);
        assert!(range.contains(1));
        assert!(range.contains(100));
        assert!(!range.contains(0));
        assert!(!range.contains(101));
    }
}
