//! Slice command implementation.
//!
//! Cuts a PNG spritesheet into frame PNGs, either on a given cell grid or
//! on the auto-detected layout.

use std::path::PathBuf;

use clap::Args;
use image::RgbaImage;

use crate::detect::DetectionCoordinator;
use crate::error::{DetectError, Result};
use crate::extract::{
    extract_frames, extract_sprites, write_frames, write_frames_json, ExtractedFrame,
};
use crate::output::{display_path, plural, Printer};
use crate::types::FrameLayout;

use super::{load_config, load_sheet};

/// Slice a sprite sheet into frame PNGs
#[derive(Args, Debug)]
pub struct SliceArgs {
    /// PNG file to slice into frames
    #[arg(required = true)]
    pub input: PathBuf,

    /// Cell size as WxH (e.g. 16x16); auto-detected when omitted
    #[arg(long)]
    pub cell: Option<String>,

    /// Output directory for frame files
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Base name for frame files (default: input filename stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Also write a TexturePacker JSON hash next to the frames
    #[arg(long)]
    pub json: bool,

    /// Keep fully transparent frames
    #[arg(long)]
    pub keep_empty: bool,

    /// Detection config file (default: pxdetect.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse a "WxH" dimension string into (width, height).
fn parse_dimensions(s: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = s.splitn(2, |c| c == 'x' || c == 'X').collect();
    if parts.len() != 2 {
        return Err(DetectError::Parse {
            message: format!("Invalid dimensions '{}': expected WxH (e.g. 16x16)", s),
            help: Some("Use the format WxH, for example: 16x16, 8x16".to_string()),
        });
    }

    let w: u32 = parts[0].parse().map_err(|_| DetectError::Parse {
        message: format!("Invalid width '{}' in dimensions '{}'", parts[0], s),
        help: Some("Width must be a positive integer".to_string()),
    })?;

    let h: u32 = parts[1].parse().map_err(|_| DetectError::Parse {
        message: format!("Invalid height '{}' in dimensions '{}'", parts[1], s),
        help: Some("Height must be a positive integer".to_string()),
    })?;

    if w == 0 || h == 0 {
        return Err(DetectError::Parse {
            message: format!("Dimensions must be non-zero, got {}x{}", w, h),
            help: Some("Both width and height must be at least 1".to_string()),
        });
    }

    Ok((w, h))
}

/// Cut the sheet on a fixed cell grid, warning about dropped partial edges.
fn slice_cells(
    img: &RgbaImage,
    cell_w: u32,
    cell_h: u32,
    skip_empty: bool,
    printer: &Printer,
) -> Result<Vec<ExtractedFrame>> {
    if img.width() % cell_w != 0 {
        printer.warning(
            "Warning",
            &format!(
                "Image width {} is not divisible by cell width {}; partial column dropped",
                img.width(),
                cell_w
            ),
        );
    }
    if img.height() % cell_h != 0 {
        printer.warning(
            "Warning",
            &format!(
                "Image height {} is not divisible by cell height {}; partial row dropped",
                img.height(),
                cell_h
            ),
        );
    }

    let layout = FrameLayout::new(cell_w, cell_h);
    let (cols, rows) = layout.grid_size(img.width(), img.height());
    printer.status(
        "Slicing",
        &format!("{}x{} grid ({}x{} cells)", cols, rows, cell_w, cell_h),
    );
    extract_frames(img, &layout, skip_empty)
}

/// Cut the sheet on its auto-detected layout.
fn slice_detected(
    img: &RgbaImage,
    args: &SliceArgs,
    skip_empty: bool,
    printer: &Printer,
) -> Result<Vec<ExtractedFrame>> {
    let config = load_config(args.config.as_deref())?;
    let result = DetectionCoordinator::new(&config).detect(img, Some(args.input.as_path()));

    for line in &result.messages {
        printer.verbose("Trace", line);
    }
    if !result.success {
        return Err(DetectError::frame_size(
            result.frame_width,
            result.frame_height,
            format!("{}; pass --cell WxH to slice manually", result.summary()),
        ));
    }
    printer.info("Detected", &result.summary());

    if result.irregular {
        printer.status(
            "Slicing",
            &format!(
                "{} by exact bounds",
                plural(result.sprite_bounds.len(), "sprite", "sprites")
            ),
        );
        return extract_sprites(img, &result.sprite_bounds, skip_empty);
    }

    let layout = result.layout();
    let (cols, rows) = layout.grid_size(img.width(), img.height());
    printer.status(
        "Slicing",
        &format!(
            "{}x{} grid ({}x{} cells)",
            cols, rows, layout.width, layout.height
        ),
    );
    extract_frames(img, &layout, skip_empty)
}

pub fn run(args: SliceArgs, printer: &Printer) -> Result<Vec<ExtractedFrame>> {
    let path = &args.input;
    let display = display_path(path);

    // Warn if not a .png file
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        printer.warning("Warning", &format!("{} does not have a .png extension", display));
    }

    printer.status("Loading", &display);
    let img = load_sheet(path)?;
    let (w, h) = img.dimensions();

    let output = args.output.clone().unwrap_or_else(|| PathBuf::from("."));

    // Resolve frame name (default: input file stem)
    let base_name = args.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sprite")
            .to_string()
    });

    printer.info(
        "Analyzed",
        &format!("{}x{} image ({} pixels)", w, h, w as u64 * h as u64),
    );

    let skip_empty = !args.keep_empty;
    let frames = match &args.cell {
        Some(cell) => {
            let (cw, ch) = parse_dimensions(cell)?;
            printer.verbose("Cell size", &format!("{}x{}", cw, ch));
            slice_cells(&img, cw, ch, skip_empty, printer)?
        }
        None => slice_detected(&img, &args, skip_empty, printer)?,
    };

    write_frames(&frames, &output, &base_name)?;

    if args.json {
        let image_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet.png");
        let json_path = output.join(format!("{}.json", base_name));
        write_frames_json(&frames, &base_name, image_name, (w, h), &json_path)?;
        printer.verbose("Wrote", &display_path(&json_path));
    }

    printer.info(
        "Finished",
        &format!(
            "{} in {}",
            plural(frames.len(), "frame", "frames"),
            display_path(&output)
        ),
    );

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fill, inset_sheet, CLEAR, RED};
    use tempfile::tempdir;

    #[test]
    fn test_parse_dimensions_valid() {
        assert_eq!(parse_dimensions("16x16").unwrap(), (16, 16));
    }

    #[test]
    fn test_parse_dimensions_rectangular() {
        assert_eq!(parse_dimensions("8x16").unwrap(), (8, 16));
    }

    #[test]
    fn test_parse_dimensions_uppercase() {
        assert_eq!(parse_dimensions("8X16").unwrap(), (8, 16));
    }

    #[test]
    fn test_parse_dimensions_invalid() {
        assert!(parse_dimensions("abc").is_err());
    }

    #[test]
    fn test_parse_dimensions_zero() {
        assert!(parse_dimensions("0x16").is_err());
    }

    #[test]
    fn test_parse_dimensions_zero_height() {
        assert!(parse_dimensions("16x0").is_err());
    }

    #[test]
    fn test_parse_dimensions_non_numeric() {
        assert!(parse_dimensions("axb").is_err());
    }

    fn args(input: PathBuf, output: PathBuf) -> SliceArgs {
        SliceArgs {
            input,
            cell: None,
            output: Some(output),
            name: None,
            json: false,
            keep_empty: false,
            config: None,
        }
    }

    #[test]
    fn test_slice_cells_drops_partial_edges() {
        // 5x3 image with 2x2 cells → 2x1 full cells
        let img = RgbaImage::from_pixel(5, 3, RED);
        let frames = slice_cells(&img, 2, 2, true, &Printer::new()).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].image.dimensions(), (2, 2));
    }

    #[test]
    fn test_slice_cells_skips_transparent() {
        // 4x2 image: left 2x2 opaque, right 2x2 transparent
        let mut img = RgbaImage::from_pixel(4, 2, CLEAR);
        fill(&mut img, 0, 0, 2, 2, RED);

        let frames = slice_cells(&img, 2, 2, true, &Printer::new()).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].index, 0);
    }

    #[test]
    fn test_run_with_cell_writes_frames() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("hero.png");
        RgbaImage::from_pixel(6, 4, RED).save(&input).unwrap();
        let out = dir.path().join("out");

        let mut slice = args(input, out.clone());
        slice.cell = Some("2x2".to_string());
        slice.json = true;
        let frames = run(slice, &Printer::new()).unwrap();

        assert_eq!(frames.len(), 6);
        assert!(out.join("hero-0.png").exists());
        assert!(out.join("hero-5.png").exists());
        assert!(out.join("hero.json").exists());
    }

    #[test]
    fn test_run_auto_detects_layout() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("walk.png");
        inset_sheet(4, 2, 32, 2).save(&input).unwrap();
        let out = dir.path().join("frames");

        let mut slice = args(input, out.clone());
        slice.name = Some("walk".to_string());
        let frames = run(slice, &Printer::new()).unwrap();

        assert_eq!(frames.len(), 8);
        for frame in &frames {
            assert_eq!(frame.image.dimensions(), (32, 32));
        }
        assert!(out.join("walk-7.png").exists());
    }
}
