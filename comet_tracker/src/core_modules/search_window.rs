// THEORY:
// The `SearchWindow` is the tracker's notion of "where to look next". It is a
// fixed-size rectangle around an integer center that moves once per frame.
//
// The window itself is never trusted to lie inside the frame. Two guards keep
// scanning well-defined:
// 1.  `region_within` intersects the window with the frame, so a window
//     hanging over an edge is scanned only where there are pixels.
// 2.  `clamp_to` pulls the center back onto the frame after every move, so a
//     run of bad scores can not walk the window off into empty space.

use crate::core_modules::centroid::Centroid;
use crate::core_modules::score_map::Coordinate;
use image::RgbImage;

/// An axis-aligned rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.x as i32, self.y as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copies the region's pixels out of `frame`.
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        image::imageops::crop_imm(frame, self.x, self.y, self.width, self.height).to_image()
    }
}

/// A fixed-size search rectangle around a movable center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    center: Centroid,
    width: u32,
    height: u32,
}

impl SearchWindow {
    pub fn new(center: Centroid, width: u32, height: u32) -> Self {
        Self { center, width, height }
    }

    pub fn center(&self) -> Centroid {
        self.center
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn recenter(&mut self, center: Centroid) {
        self.center = center;
    }

    /// Top-left corner of the unclipped window. May be negative.
    pub fn top_left(&self) -> (i64, i64) {
        (
            self.center.x as i64 - (self.width / 2) as i64,
            self.center.y as i64 - (self.height / 2) as i64,
        )
    }

    /// The part of the window that lies inside a `frame_width` x `frame_height`
    /// frame, or `None` when they do not overlap.
    pub fn region_within(&self, frame_width: u32, frame_height: u32) -> Option<Region> {
        let (left, top) = self.top_left();
        let right = left + self.width as i64;
        let bottom = top + self.height as i64;

        let x0 = left.clamp(0, frame_width as i64);
        let y0 = top.clamp(0, frame_height as i64);
        let x1 = right.clamp(0, frame_width as i64);
        let y1 = bottom.clamp(0, frame_height as i64);

        let region = Region::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
        (!region.is_empty()).then_some(region)
    }

    /// Pulls the center onto the frame. Returns true if it had to move.
    pub fn clamp_to(&mut self, frame_width: u32, frame_height: u32) -> bool {
        if frame_width == 0 || frame_height == 0 {
            return false;
        }
        let clamped = Centroid::new(
            self.center.x.clamp(0, frame_width as i32 - 1),
            self.center.y.clamp(0, frame_height as i32 - 1),
        );
        let moved = clamped != self.center;
        self.center = clamped;
        moved
    }
}
