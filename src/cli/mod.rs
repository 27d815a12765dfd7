pub mod completions;
pub mod detect;
pub mod segment;
pub mod slice;

use std::path::Path;

use clap::{Parser, Subcommand};
use image::RgbaImage;

use crate::config::DetectionConfig;
use crate::error::{DetectError, Result};
use crate::output::display_path;

/// pxdetect - Sprite sheet frame and sprite detection
#[derive(Parser, Debug)]
#[command(name = "pxdetect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show the full detection trace and debug logs
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect frame size, margins and spacing of sprite sheets
    Detect(detect::DetectArgs),

    /// List the sprite rectangles found by connected-component segmentation
    Segment(segment::SegmentArgs),

    /// Slice a sprite sheet into frame PNGs
    Slice(slice::SliceArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Load a sheet as RGBA.
pub(crate) fn load_sheet(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(DetectError::Io {
            path: path.to_path_buf(),
            message: format!("File not found: {}", display_path(path)),
        });
    }

    let img = image::open(path)
        .map_err(|e| DetectError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to load image: {}", e),
        })?
        .to_rgba8();

    if img.width() == 0 || img.height() == 0 {
        return Err(DetectError::NoImage);
    }
    Ok(img)
}

/// Config from `--config`, else `pxdetect.yaml` in the working directory.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<DetectionConfig> {
    let cwd = std::env::current_dir()?;
    DetectionConfig::resolve(explicit, &cwd)
}
