//! Size statistics, irregularity classification, and layout inference
//! over a set of sprite rectangles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SegmentationConfig;
use crate::types::Rect;

/// Width/height statistics across a set of rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeStats {
    pub count: usize,
    pub mean_w: f64,
    pub mean_h: f64,
    pub std_w: f64,
    pub std_h: f64,
    pub min_w: u32,
    pub max_w: u32,
    pub min_h: u32,
    pub max_h: u32,
}

impl SizeStats {
    /// Population statistics, `None` for an empty set.
    pub fn of(rects: &[Rect]) -> Option<Self> {
        if rects.is_empty() {
            return None;
        }

        let n = rects.len() as f64;
        let mean_w = rects.iter().map(|r| r.width as f64).sum::<f64>() / n;
        let mean_h = rects.iter().map(|r| r.height as f64).sum::<f64>() / n;
        let var_w = rects
            .iter()
            .map(|r| (r.width as f64 - mean_w).powi(2))
            .sum::<f64>()
            / n;
        let var_h = rects
            .iter()
            .map(|r| (r.height as f64 - mean_h).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            count: rects.len(),
            mean_w,
            mean_h,
            std_w: var_w.sqrt(),
            std_h: var_h.sqrt(),
            min_w: rects.iter().map(|r| r.width).min().unwrap_or(0),
            max_w: rects.iter().map(|r| r.width).max().unwrap_or(0),
            min_h: rects.iter().map(|r| r.height).min().unwrap_or(0),
            max_h: rects.iter().map(|r| r.height).max().unwrap_or(0),
        })
    }

    /// Mean of the width and height standard deviations.
    pub fn diversity(&self) -> f64 {
        (self.std_w + self.std_h) / 2.0
    }

    pub fn is_uniform(&self, max_std: f64) -> bool {
        self.std_w < max_std && self.std_h < max_std
    }
}

/// True for large collections with widely varying sprite sizes.
pub fn is_irregular(rects: &[Rect], stats: &SizeStats, config: &SegmentationConfig) -> bool {
    if stats.count <= config.irregular_count {
        return false;
    }

    let ratio = |max: u32, min: u32| max as f64 / min.max(1) as f64;
    let small = rects
        .iter()
        .filter(|r| r.width < config.small_size || r.height < config.small_size)
        .count();

    stats.diversity() > config.irregular_std
        || ratio(stats.max_w, stats.min_w) > config.irregular_ratio
        || ratio(stats.max_h, stats.min_h) > config.irregular_ratio
        || small > config.small_count
}

/// Collapse sorted unique positions into groups whose neighbours are at
/// most `tolerance` apart.
pub fn group_positions(positions: &[u32], tolerance: u32) -> Vec<u32> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups: Vec<Vec<u32>> = Vec::new();
    for pos in sorted {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|&last| pos - last <= tolerance) => {
                group.push(pos)
            }
            _ => groups.push(vec![pos]),
        }
    }

    groups
        .iter()
        .map(|g| (g.iter().map(|&p| p as u64).sum::<u64>() / g.len() as u64) as u32)
        .collect()
}

/// Grid inferred from component centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridFit {
    pub cols: u32,
    pub rows: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Infer a uniform grid from the centers of `rects` on a
/// `sheet_width` x `sheet_height` sheet.
pub fn infer_grid(
    rects: &[Rect],
    stats: &SizeStats,
    sheet_width: u32,
    sheet_height: u32,
    config: &SegmentationConfig,
) -> GridFit {
    let centers_x: Vec<u32> = rects.iter().map(|r| r.center().0).collect();
    let centers_y: Vec<u32> = rects.iter().map(|r| r.center().1).collect();

    let cols = group_positions(&centers_x, config.group_tolerance).len() as u32;

    let y_min = centers_y.iter().copied().min().unwrap_or(0);
    let y_max = centers_y.iter().copied().max().unwrap_or(0);
    let rows = if (y_max - y_min) as f64 <= stats.mean_h * config.strip_row_fraction {
        1
    } else {
        group_positions(&centers_y, config.group_tolerance).len() as u32
    };

    GridFit {
        cols,
        rows,
        frame_width: sheet_width / cols.max(1),
        frame_height: sheet_height / rows.max(1),
    }
}

/// Most frequent `(width, height)`, ties to the first seen, with its count.
pub fn mode_size(rects: &[Rect]) -> Option<((u32, u32), usize)> {
    let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
    let mut order = Vec::new();
    for rect in rects {
        let count = counts.entry(rect.size()).or_insert(0);
        if *count == 0 {
            order.push(rect.size());
        }
        *count += 1;
    }

    let mut best: Option<((u32, u32), usize)> = None;
    for size in order {
        let count = counts[&size];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((size, count));
        }
    }
    best
}

/// Median of `values`, averaging the middle pair, truncated.
fn median(values: &mut [u32]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        ((values[mid - 1] as u64 + values[mid] as u64) / 2) as u32
    }
}

pub fn median_size(rects: &[Rect]) -> (u32, u32) {
    let mut widths: Vec<u32> = rects.iter().map(|r| r.width).collect();
    let mut heights: Vec<u32> = rects.iter().map(|r| r.height).collect();
    (median(&mut widths), median(&mut heights))
}

/// Candidate sprite sizes for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeAlternatives {
    pub mode: (u32, u32),
    pub median: (u32, u32),
    pub mean: (u32, u32),
}

impl SizeAlternatives {
    pub fn of(rects: &[Rect], stats: &SizeStats) -> Self {
        Self {
            mode: mode_size(rects).map(|(size, _)| size).unwrap_or_default(),
            median: median_size(rects),
            mean: (stats.mean_w as u32, stats.mean_h as u32),
        }
    }
}

/// How a fallback size was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackChoice {
    Mode,
    Median,
}

/// Pick a representative sprite size for a non-grid collection.
///
/// The mode wins when it covers at least `mode_floor` of the components,
/// or when the median lies within `median_proximity` of it on both axes.
pub fn choose_fallback(
    alternatives: &SizeAlternatives,
    mode_count: usize,
    total: usize,
    config: &SegmentationConfig,
) -> ((u32, u32), FallbackChoice) {
    let share = mode_count as f64 / total.max(1) as f64;
    if share >= config.mode_floor {
        return (alternatives.mode, FallbackChoice::Mode);
    }

    let (mode_w, mode_h) = alternatives.mode;
    let (median_w, median_h) = alternatives.median;
    if mode_w.abs_diff(median_w) <= config.median_proximity
        && mode_h.abs_diff(median_h) <= config.median_proximity
    {
        (alternatives.mode, FallbackChoice::Mode)
    } else {
        (alternatives.median, FallbackChoice::Median)
    }
}
