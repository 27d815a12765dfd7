//! Segment command implementation.
//!
//! Prints one `x y width height` line per sprite on stdout.

use std::path::PathBuf;

use clap::Args;

use crate::error::{DetectError, Result};
use crate::output::{display_path, plural, Printer};
use crate::segment::{SegmentationOutcome, Segmenter};

use super::{load_config, load_sheet};

/// List the sprite rectangles found by connected-component segmentation
#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// PNG sprite sheet
    #[arg(required = true)]
    pub input: PathBuf,

    /// Background colour to key out as RRGGBB (default: auto)
    #[arg(long)]
    pub background: Option<String>,

    /// Colour-key tolerance per channel
    #[arg(long, default_value = "15")]
    pub tolerance: u8,

    /// Print the full segmentation as JSON instead
    #[arg(long)]
    pub json: bool,

    /// Detection config file (default: pxdetect.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Parse an `RRGGBB` or `#RRGGBB` colour.
fn parse_hex_colour(s: &str) -> Result<[u8; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    let invalid = || DetectError::Parse {
        message: format!("Invalid colour '{}': expected RRGGBB", s),
        help: Some("Use six hex digits, for example: ff00ff".to_string()),
    };

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
    }
    Ok(rgb)
}

fn print_outcome(outcome: &SegmentationOutcome, display: &str, printer: &Printer) {
    for line in &outcome.messages {
        printer.verbose("Trace", line);
    }

    let kind = if outcome.irregular {
        "irregular"
    } else {
        "regular"
    };
    printer.status(
        "Segmented",
        &format!(
            "{}: {} ({}, {}x{} via {}, {} confidence)",
            display,
            plural(outcome.sprite_count(), "sprite", "sprites"),
            kind,
            outcome.frame_width,
            outcome.frame_height,
            outcome.method,
            outcome.confidence
        ),
    );
}

pub fn run(args: SegmentArgs, printer: &Printer) -> Result<SegmentationOutcome> {
    let config = load_config(args.config.as_deref())?;
    let path = &args.input;
    let display = display_path(path);

    let background = match &args.background {
        Some(hex) => Some((parse_hex_colour(hex)?, args.tolerance)),
        None => None,
    };

    printer.status("Loading", &display);
    let img = load_sheet(path)?;

    let outcome = Segmenter::new(&config).segment(&img, background)?;
    print_outcome(&outcome, &display, printer);

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).map_err(|e| DetectError::Parse {
            message: format!("Failed to serialize segmentation: {}", e),
            help: None,
        })?;
        println!("{}", json);
    } else {
        for rect in &outcome.sprite_bounds {
            println!("{} {} {} {}", rect.x, rect.y, rect.width, rect.height);
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::inset_sheet;
    use tempfile::tempdir;

    #[test]
    fn test_parse_hex_colour() {
        assert_eq!(parse_hex_colour("ff00ff").unwrap(), [255, 0, 255]);
        assert_eq!(parse_hex_colour("#0A141E").unwrap(), [10, 20, 30]);
    }

    #[test]
    fn test_parse_hex_colour_invalid() {
        assert!(parse_hex_colour("fff").is_err());
        assert!(parse_hex_colour("gg0000").is_err());
        assert!(parse_hex_colour("ff00ff00").is_err());
    }

    #[test]
    fn test_run_segments_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        inset_sheet(3, 2, 32, 2).save(&path).unwrap();

        let args = SegmentArgs {
            input: path,
            background: None,
            tolerance: 15,
            json: false,
            config: None,
        };
        let outcome = run(args, &Printer::new()).unwrap();
        assert_eq!(outcome.sprite_count(), 6);
        assert_eq!(outcome.frame_size(), (32, 32));
    }
}
