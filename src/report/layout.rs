//! Pixel geometry of the report. Pure functions, no drawing.

use crate::{
    foundation::{
        core::{Point, Rect},
        math::map_range,
    },
    render::Rgba8,
    score::{MAX_SCORE, ScoreData},
};

pub const GRAPH_LINE_WIDTH: f64 = 3.0;

const GRID_SHADE_EVEN: u8 = 100;
const GRID_SHADE_ODD: u8 = 30;

/// Thumbnails tiling the full viewport width at the video's aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThumbStrip {
    pub count: u32,
    pub tile_width: f64,
    pub tile_height: f64,
    pub top: f64,
    pub width: f64,
}

impl ThumbStrip {
    /// Fit `round(width / (aspect * target_height))` tiles across `width`, then
    /// stretch them so they meet exactly. At least one tile is always laid out.
    ///
    /// Returns `None` when any input is not a positive finite number.
    pub fn compute(width: f64, target_height: f64, aspect: f64, top: f64) -> Option<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(width) || !positive(target_height) || !positive(aspect) {
            return None;
        }
        let natural_width = aspect * target_height;
        let count = ((width / natural_width).round() as u32).max(1);
        let tile_width = width / f64::from(count);
        Some(Self {
            count,
            tile_width,
            tile_height: tile_width / aspect,
            top,
            width,
        })
    }

    pub fn tile_rect(&self, index: u32) -> Rect {
        let x = map_range(f64::from(index), 0.0, f64::from(self.count), 0.0, self.width);
        Rect::new(x, self.top, x + self.tile_width, self.top + self.tile_height)
    }

    /// Frames are spread evenly from the first to the last across the tiles.
    pub fn frame_for_tile(&self, index: u32, total_frames: u64) -> u64 {
        if total_frames == 0 {
            return 0;
        }
        let last = (total_frames - 1) as f64;
        map_range(f64::from(index), 0.0, f64::from(self.count - 1), 0.0, last)
            .clamp(0.0, last) as u64
    }
}

/// Graph x-axis extent: the video's frame count, or the number of samples
/// when no video is loaded.
pub fn graph_domain(total_frames: Option<u64>, samples: usize) -> f64 {
    match total_frames {
        Some(frames) => frames as f64,
        None => samples as f64,
    }
}

/// Position of a sample inside the graph band: frame along x, score along y
/// with 0 at the bottom and 100 at the top.
pub fn graph_point(sample: ScoreData, domain: f64, band: Rect) -> Point {
    let x = map_range(sample.frame as f64, 0.0, domain, band.x0, band.x1);
    let y = map_range(
        f64::from(sample.score),
        0.0,
        f64::from(MAX_SCORE),
        band.y1,
        band.y0,
    );
    Point::new(x, y)
}

/// Horizontal grid lines evenly spanning the band, top to bottom, with
/// alternating shades.
pub fn grid_lines(band: Rect, count: u32) -> Vec<(f64, Rgba8)> {
    let last = f64::from(count.saturating_sub(1));
    (0..count)
        .map(|i| {
            let y = map_range(f64::from(i), 0.0, last, band.y0, band.y1).round();
            let shade = if i % 2 == 1 {
                GRID_SHADE_ODD
            } else {
                GRID_SHADE_EVEN
            };
            (y, Rgba8::gray(shade))
        })
        .collect()
}

/// Frame under the cursor when the viewport width stands for the whole video.
pub fn scrub_frame(cursor_x: f64, width: f64, total_frames: u64) -> u64 {
    if total_frames == 0 || !cursor_x.is_finite() {
        return 0;
    }
    let last = (total_frames - 1) as f64;
    map_range(cursor_x, 0.0, width, 0.0, total_frames as f64).clamp(0.0, last) as u64
}

/// Where the scrub preview goes: follows the cursor but stays inside the viewport.
pub fn scrub_rect(cursor_x: f64, width: f64, aspect: f64, height: f64, top: f64) -> Rect {
    let tile_width = aspect * height;
    let x = cursor_x.min(width - tile_width).max(0.0);
    Rect::new(x, top, x + tile_width, top + height)
}
