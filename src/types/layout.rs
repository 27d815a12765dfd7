//! Grid geometry for slicing a sheet into frames.

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::types::Rect;

/// Largest accepted frame dimension.
pub const MAX_FRAME_SIZE: u32 = 2048;
/// Largest accepted offset.
pub const MAX_OFFSET: u32 = 1000;
/// Largest accepted spacing.
pub const MAX_SPACING: u32 = 20;

/// Frame size, margins and gaps of a uniform grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub spacing_x: u32,
    pub spacing_y: u32,
}

impl FrameLayout {
    /// Tightly packed grid with no margins.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_offset(mut self, offset_x: u32, offset_y: u32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn with_spacing(mut self, spacing_x: u32, spacing_y: u32) -> Self {
        self.spacing_x = spacing_x;
        self.spacing_y = spacing_y;
        self
    }

    /// Check the layout against bounds and the sheet size.
    pub fn validate(&self, sheet_width: u32, sheet_height: u32) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                "frame dimensions must be greater than 0",
            ));
        }
        if self.width > MAX_FRAME_SIZE || self.height > MAX_FRAME_SIZE {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                format!("frame dimensions must not exceed {}", MAX_FRAME_SIZE),
            ));
        }
        if self.offset_x > MAX_OFFSET || self.offset_y > MAX_OFFSET {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                format!(
                    "offset {},{} exceeds {}",
                    self.offset_x, self.offset_y, MAX_OFFSET
                ),
            ));
        }
        if self.spacing_x > MAX_SPACING || self.spacing_y > MAX_SPACING {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                format!(
                    "spacing {},{} exceeds {}",
                    self.spacing_x, self.spacing_y, MAX_SPACING
                ),
            ));
        }
        if self.offset_x + self.width > sheet_width {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                format!(
                    "frame width + margin ({}) exceeds sheet width ({})",
                    self.offset_x + self.width,
                    sheet_width
                ),
            ));
        }
        if self.offset_y + self.height > sheet_height {
            return Err(DetectError::frame_size(
                self.width,
                self.height,
                format!(
                    "frame height + margin ({}) exceeds sheet height ({})",
                    self.offset_y + self.height,
                    sheet_height
                ),
            ));
        }
        Ok(())
    }

    /// Columns and rows that fit on a sheet, counting each gap only
    /// between frames.
    pub fn grid_size(&self, sheet_width: u32, sheet_height: u32) -> (u32, u32) {
        let fit = |sheet: u32, offset: u32, frame: u32, spacing: u32| {
            if frame == 0 {
                return 0;
            }
            let available = sheet.saturating_sub(offset);
            (available + spacing) / (frame + spacing)
        };

        (
            fit(sheet_width, self.offset_x, self.width, self.spacing_x),
            fit(sheet_height, self.offset_y, self.height, self.spacing_y),
        )
    }

    pub fn frame_count(&self, sheet_width: u32, sheet_height: u32) -> u32 {
        let (cols, rows) = self.grid_size(sheet_width, sheet_height);
        cols * rows
    }

    /// Every grid cell in row-major order.
    pub fn frame_rects(&self, sheet_width: u32, sheet_height: u32) -> Vec<Rect> {
        let (cols, rows) = self.grid_size(sheet_width, sheet_height);
        let mut rects = Vec::with_capacity((cols * rows) as usize);

        for row in 0..rows {
            for col in 0..cols {
                rects.push(Rect::new(
                    self.offset_x + col * (self.width + self.spacing_x),
                    self.offset_y + row * (self.height + self.spacing_y),
                    self.width,
                    self.height,
                ));
            }
        }

        rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_counts_inner_gaps() {
        // 6 + 4*16 + 3*4 = 82
        let layout = FrameLayout::new(16, 16).with_offset(6, 6).with_spacing(4, 4);
        assert_eq!(layout.grid_size(82, 82), (4, 4));
        assert_eq!(layout.grid_size(81, 82), (3, 4));
        assert_eq!(layout.frame_count(82, 82), 16);
    }

    #[test]
    fn test_frame_rects() {
        let layout = FrameLayout::new(10, 8).with_offset(1, 2).with_spacing(3, 0);
        let rects = layout.frame_rects(24, 18);
        assert_eq!(
            rects,
            vec![
                Rect::new(1, 2, 10, 8),
                Rect::new(14, 2, 10, 8),
                Rect::new(1, 10, 10, 8),
                Rect::new(14, 10, 10, 8),
            ]
        );
        assert!(rects.iter().all(|r| r.fits_within(24, 18)));
    }

    #[test]
    fn test_validate() {
        assert!(FrameLayout::new(32, 32).validate(64, 64).is_ok());
        assert!(FrameLayout::new(0, 32).validate(64, 64).is_err());
        assert!(FrameLayout::new(4096, 32).validate(8192, 64).is_err());
        assert!(FrameLayout::new(32, 32).with_spacing(21, 0).validate(128, 64).is_err());
        assert!(FrameLayout::new(32, 32).with_offset(40, 0).validate(64, 64).is_err());
    }

    #[test]
    fn test_zero_frame_grid_is_empty() {
        assert_eq!(FrameLayout::default().grid_size(64, 64), (0, 0));
        assert!(FrameLayout::default().frame_rects(64, 64).is_empty());
    }
}
