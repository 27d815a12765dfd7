//! Detect command implementation.
//!
//! Runs full auto-detection on one or more sheets. Directories contribute
//! the `.png` files directly inside them.

use std::path::{Path, PathBuf};

use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::DetectionConfig;
use crate::detect::{DetectionCoordinator, DetectionResult, DetectionStatus};
use crate::error::{DetectError, Result};
use crate::output::{display_path, plural, Printer};

use super::{load_config, load_sheet};

/// Detect frame size, margins and spacing of sprite sheets
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Sprite sheets, or directories of sheets
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Print results as a JSON array on stdout
    #[arg(long)]
    pub json: bool,

    /// Detection config file (default: pxdetect.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Detection outcome for one sheet.
#[derive(Debug, Serialize)]
pub struct SheetReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub result: Option<DetectionResult>,
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// Expand directories one level deep into their `.png` files.
pub fn collect_sheets(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sheets = Vec::new();

    for path in paths {
        if !path.is_dir() {
            sheets.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let file = entry.path();
            if file.is_file() && is_png(file) {
                sheets.push(file.to_path_buf());
            }
        }
    }

    sheets
}

fn analyse(path: &Path, config: &DetectionConfig) -> SheetReport {
    match load_sheet(path) {
        Ok(img) => SheetReport {
            path: path.to_path_buf(),
            error: None,
            result: Some(DetectionCoordinator::new(config).detect(&img, Some(path))),
        },
        Err(err) => SheetReport {
            path: path.to_path_buf(),
            error: Some(err.to_string()),
            result: None,
        },
    }
}

/// Analyse every sheet in parallel. Reports keep input order.
pub fn detect_sheets(sheets: &[PathBuf], config: &DetectionConfig) -> Vec<SheetReport> {
    sheets.par_iter().map(|path| analyse(path, config)).collect()
}

fn print_report(report: &SheetReport, printer: &Printer) {
    let display = display_path(&report.path);

    let result = match (&report.result, &report.error) {
        (Some(result), _) => result,
        (None, error) => {
            let reason = error.as_deref().unwrap_or("unknown error");
            printer.error("Failed", &format!("{}: {}", display, reason));
            return;
        }
    };

    match result.status {
        DetectionStatus::Success => {
            let layout = result.layout();
            printer.status(
                "Detected",
                &format!(
                    "{}: {}x{} frames, offset {},{}, spacing {},{} ({} confidence)",
                    display,
                    layout.width,
                    layout.height,
                    layout.offset_x,
                    layout.offset_y,
                    layout.spacing_x,
                    layout.spacing_y,
                    printer.confidence(result.confidence_level())
                ),
            );
        }
        DetectionStatus::SuccessWithWarnings => {
            printer.warning("Detected", &format!("{}: {}", display, result.summary()));
        }
        DetectionStatus::Failed => {
            printer.error("Failed", &format!("{}: {}", display, result.summary()));
        }
    }

    for line in &result.messages {
        printer.verbose("Trace", line);
    }
}

pub fn run(args: DetectArgs, printer: &Printer) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let sheets = collect_sheets(&args.paths);

    if sheets.is_empty() {
        let path = args.paths.first().cloned().unwrap_or_else(|| PathBuf::from("."));
        return Err(DetectError::Io {
            message: format!("No .png sprite sheets found in {}", display_path(&path)),
            path,
        });
    }

    printer.status("Analyzing", &plural(sheets.len(), "sheet", "sheets"));
    let reports = detect_sheets(&sheets, &config);

    for report in &reports {
        print_report(report, printer);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&reports).map_err(|e| DetectError::Parse {
            message: format!("Failed to serialize results: {}", e),
            help: None,
        })?;
        println!("{}", json);
    }

    let failed = reports
        .iter()
        .filter(|r| r.result.as_ref().map_or(true, |d| !d.success))
        .count();
    if failed > 0 {
        printer.info(
            "Finished",
            &format!("{} ({} failed)", plural(reports.len(), "sheet", "sheets"), failed),
        );
    } else {
        printer.info("Finished", &plural(reports.len(), "sheet", "sheets"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::inset_sheet;
    use tempfile::tempdir;

    #[test]
    fn test_collect_sheets_walks_one_level() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.PNG"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"").unwrap();

        let sheets = collect_sheets(&[dir.path().to_path_buf()]);
        assert_eq!(
            sheets,
            vec![dir.path().join("a.PNG"), dir.path().join("b.png")]
        );
    }

    #[test]
    fn test_collect_sheets_keeps_files() {
        let sheets = collect_sheets(&[PathBuf::from("missing.png")]);
        assert_eq!(sheets, vec![PathBuf::from("missing.png")]);
    }

    #[test]
    fn test_detect_sheets_in_order() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.png");
        inset_sheet(4, 4, 32, 2).save(&good).unwrap();
        let missing = dir.path().join("missing.png");

        let config = DetectionConfig::default();
        let reports = detect_sheets(&[good.clone(), missing.clone()], &config);

        assert_eq!(reports[0].path, good);
        let result = reports[0].result.as_ref().unwrap();
        assert!(result.success);
        assert_eq!((result.frame_width, result.frame_height), (32, 32));

        assert_eq!(reports[1].path, missing);
        assert!(reports[1].result.is_none());
        assert!(reports[1].error.as_deref().unwrap().contains("File not found"));
    }

    #[test]
    fn test_report_json_is_flat() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        inset_sheet(2, 2, 16, 2).save(&path).unwrap();

        let reports = detect_sheets(&[path], &DetectionConfig::default());
        let value = serde_json::to_value(&reports).unwrap();
        assert_eq!(value[0]["frame_width"], 16);
        assert_eq!(value[0]["status"], "success");
        assert!(value[0].get("error").is_none());
    }
}
