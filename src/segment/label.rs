//! Connected-component labelling of binary masks.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::types::Rect;

/// Bounding box of every 4-connected foreground component, in label order.
pub fn label_components(mask: &GrayImage) -> Vec<Rect> {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));

    // (x0, y0, x1, y1) per label, exclusive ends.
    let mut boxes: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let id = label.0[0] as usize;
        if id == 0 {
            continue;
        }
        if boxes.len() < id {
            boxes.resize(id, None);
        }

        let slot = &mut boxes[id - 1];
        *slot = Some(match *slot {
            None => (x, y, x + 1, y + 1),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
        });
    }

    boxes
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1)| Rect::from_corners(x0, y0, x1, y1))
        .collect()
}

/// Number of 4-connected foreground components.
pub fn count_components(mask: &GrayImage) -> u32 {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));
    labels.pixels().map(|p| p.0[0]).max().unwrap_or(0)
}
