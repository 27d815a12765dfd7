//! Synthetic sprite sheets for unit tests.

use image::{Rgba, RgbaImage};

pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const RED: Rgba<u8> = Rgba([220, 40, 40, 255]);

/// Fill `w` x `h` pixels at `(x, y)`.
pub fn fill(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, colour: Rgba<u8>) {
    for py in y..y + h {
        for px in x..x + w {
            img.put_pixel(px, py, colour);
        }
    }
}

/// Grid of `cols` x `rows` opaque tiles on a transparent sheet.
///
/// Tiles are `tile` pixels square, start at `(offset_x, offset_y)`, and
/// are separated by `spacing_x` / `spacing_y`. `trailing` extra
/// transparent pixels are added on the right and bottom.
#[allow(clippy::too_many_arguments)]
pub fn tile_sheet(
    cols: u32,
    rows: u32,
    tile: u32,
    offset_x: u32,
    offset_y: u32,
    spacing_x: u32,
    spacing_y: u32,
    trailing: u32,
) -> RgbaImage {
    let width = offset_x + cols * tile + cols.saturating_sub(1) * spacing_x + trailing;
    let height = offset_y + rows * tile + rows.saturating_sub(1) * spacing_y + trailing;
    let mut img = RgbaImage::from_pixel(width, height, CLEAR);

    for row in 0..rows {
        for col in 0..cols {
            let x = offset_x + col * (tile + spacing_x);
            let y = offset_y + row * (tile + spacing_y);
            fill(&mut img, x, y, tile, tile, RED);
        }
    }

    img
}

/// Grid of `cell`-sized cells, each holding an opaque sprite inset by
/// `inset` pixels on every side.
pub fn inset_sheet(cols: u32, rows: u32, cell: u32, inset: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(cols * cell, rows * cell, CLEAR);
    for row in 0..rows {
        for col in 0..cols {
            fill(
                &mut img,
                col * cell + inset,
                row * cell + inset,
                cell - 2 * inset,
                cell - 2 * inset,
                RED,
            );
        }
    }
    img
}
