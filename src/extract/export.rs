//! PNG and TexturePacker JSON output for extracted frames.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{DetectError, Result};

use super::ExtractedFrame;

/// File stem for a frame: `hero-0`, `hero-1`, ...
pub fn frame_name(base_name: &str, frame: &ExtractedFrame) -> String {
    format!("{}-{}", base_name, frame.index)
}

/// Write each frame as `<dir>/<base>-<index>.png`, creating `dir` if needed.
pub fn write_frames(frames: &[ExtractedFrame], dir: &Path, base_name: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| DetectError::Io {
            path: dir.to_path_buf(),
            message: format!("Failed to create output directory: {}", e),
        })?;
    }

    let mut written = Vec::with_capacity(frames.len());
    for frame in frames {
        let path = dir.join(format!("{}.png", frame_name(base_name, frame)));
        frame.image.save(&path).map_err(|e| DetectError::Io {
            path: path.clone(),
            message: format!("Failed to write PNG: {}", e),
        })?;
        written.push(path);
    }

    Ok(written)
}

/// Write frame rectangles as TexturePacker-compatible JSON Hash format.
///
/// `image` names the source sheet and `size` is its dimensions.
pub fn write_frames_json(
    frames: &[ExtractedFrame],
    base_name: &str,
    image: &str,
    size: (u32, u32),
    path: &Path,
) -> Result<()> {
    let output = TexturePackerJson::new(frames, base_name, image, size);
    let json = serde_json::to_string_pretty(&output).map_err(|e| DetectError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to serialize frame metadata: {}", e),
    })?;
    fs::write(path, json).map_err(|e| DetectError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write frame metadata: {}", e),
    })?;
    Ok(())
}

// --- TexturePacker JSON serialization types ---

#[derive(Serialize)]
struct TexturePackerJson {
    frames: BTreeMap<String, TPFrame>,
    meta: TPMeta,
}

#[derive(Serialize)]
struct TPFrame {
    frame: TPRect,
    rotated: bool,
    trimmed: bool,
    #[serde(rename = "spriteSourceSize")]
    sprite_source_size: TPRect,
    #[serde(rename = "sourceSize")]
    source_size: TPSize,
}

#[derive(Serialize)]
struct TPRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct TPSize {
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct TPMeta {
    app: String,
    image: String,
    size: TPSize,
    scale: String,
}

impl TexturePackerJson {
    fn new(frames: &[ExtractedFrame], base_name: &str, image: &str, size: (u32, u32)) -> Self {
        let frames = frames
            .iter()
            .map(|f| {
                let r = f.rect;
                let entry = TPFrame {
                    frame: TPRect {
                        x: r.x,
                        y: r.y,
                        w: r.width,
                        h: r.height,
                    },
                    rotated: false,
                    trimmed: false,
                    sprite_source_size: TPRect {
                        x: 0,
                        y: 0,
                        w: r.width,
                        h: r.height,
                    },
                    source_size: TPSize {
                        w: r.width,
                        h: r.height,
                    },
                };
                (frame_name(base_name, f), entry)
            })
            .collect();

        TexturePackerJson {
            frames,
            meta: TPMeta {
                app: "pxdetect".to_string(),
                image: image.to_string(),
                size: TPSize {
                    w: size.0,
                    h: size.1,
                },
                scale: "1".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_frames;
    use crate::testing::tile_sheet;
    use crate::types::FrameLayout;
    use tempfile::tempdir;

    #[test]
    fn test_write_frames_png() {
        let img = tile_sheet(2, 1, 8, 0, 0, 0, 0, 0);
        let frames = extract_frames(&img, &FrameLayout::new(8, 8), false).unwrap();

        let dir = tempdir().unwrap();
        let out = dir.path().join("frames");
        let written = write_frames(&frames, &out, "hero").unwrap();

        assert_eq!(written, vec![out.join("hero-0.png"), out.join("hero-1.png")]);
        let back = image::open(&written[1]).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (8, 8));
        assert_eq!(back.get_pixel(3, 3).0, [220, 40, 40, 255]);
    }

    #[test]
    fn test_write_frames_json() {
        let img = tile_sheet(2, 1, 8, 0, 0, 2, 0, 0);
        let layout = FrameLayout::new(8, 8).with_spacing(2, 0);
        let frames = extract_frames(&img, &layout, false).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("hero.json");
        write_frames_json(&frames, "hero", "hero.png", (18, 8), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        // Verify TexturePacker structure
        assert_eq!(parsed["frames"]["hero-1"]["frame"]["x"], 10);
        assert_eq!(parsed["frames"]["hero-1"]["frame"]["w"], 8);
        assert_eq!(parsed["frames"]["hero-0"]["rotated"], false);
        assert_eq!(parsed["meta"]["image"], "hero.png");
        assert_eq!(parsed["meta"]["size"]["w"], 18);
        assert_eq!(parsed["meta"]["scale"], "1");
    }
}
