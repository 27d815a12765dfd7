//! Synthetic sprite sheets shared by the integration tests.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};

pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const INK: Rgba<u8> = Rgba([60, 120, 200, 255]);

pub fn fill(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    for py in y..y + h {
        for px in x..x + w {
            img.put_pixel(px, py, INK);
        }
    }
}

/// `cols` x `rows` opaque tiles with margins, gaps and trailing padding.
#[allow(clippy::too_many_arguments)]
pub fn grid_sheet(
    cols: u32,
    rows: u32,
    tile: u32,
    offset: (u32, u32),
    spacing: (u32, u32),
    trailing: u32,
) -> RgbaImage {
    let width = offset.0 + cols * tile + (cols - 1) * spacing.0 + trailing;
    let height = offset.1 + rows * tile + (rows - 1) * spacing.1 + trailing;
    let mut img = RgbaImage::from_pixel(width, height, CLEAR);
    for row in 0..rows {
        for col in 0..cols {
            fill(
                &mut img,
                offset.0 + col * (tile + spacing.0),
                offset.1 + row * (tile + spacing.1),
                tile,
                tile,
            );
        }
    }
    img
}

/// Grid of `cell`-sized cells, each with a sprite inset by `inset`.
pub fn inset_sheet(cols: u32, rows: u32, cell: u32, inset: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(cols * cell, rows * cell, CLEAR);
    for row in 0..rows {
        for col in 0..cols {
            let size = cell - 2 * inset;
            fill(&mut img, col * cell + inset, row * cell + inset, size, size);
        }
    }
    img
}
