// THEORY:
// The `WindowColorMap` builder turns the pixels under the search window into a
// `ScoreMap`. It is the bridge between raw image data and the score-based
// analysis that every later stage works on.
//
// Key architectural principles:
// 1.  **Absolute Keys**: Each pixel at row `r`, column `c` of the sub-frame is
//     stored under `(c + origin.x, r + origin.y)`, i.e. its position in the
//     full frame.
// 2.  **Fail Fast**: A coordinate produced twice aborts the build with
//     `TrackerError::DuplicateCoordinate`. Correct window math never triggers it.
// 3.  **Embarrassingly Parallel**: A pixel's score depends on nothing but that
//     pixel, so `build_parallel` can hand disjoint row bands to blocking workers.
//     Every worker fills its own partial map; the partial maps are merged only
//     after all workers have finished, so no caller ever sees a half-built map.

use crate::core_modules::color_matcher::ColorMatcher;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::score_map::{Coordinate, ScoreMap};
use crate::core_modules::search_window::Region;
use crate::error::{TrackerError, TrackerResult};
use futures::future::join_all;
use image::RgbImage;
use std::ops::Range;
use std::sync::Arc;

/// Worker count used when the caller does not pick one.
pub fn default_workers() -> usize {
    num_cpus::get()
}

/// Scores every pixel of a sub-frame against the reference color.
#[derive(Debug, Clone)]
pub struct WindowColorMap {
    matcher: ColorMatcher,
}

impl WindowColorMap {
    pub fn new(matcher: ColorMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &ColorMatcher {
        &self.matcher
    }

    /// Builds the score map of `sub_frame`, whose top-left pixel sits at `origin` in the full frame.
    pub fn build(&self, sub_frame: &RgbImage, origin: Coordinate) -> TrackerResult<ScoreMap> {
        score_rows(&self.matcher, sub_frame, origin, 0..sub_frame.height())
    }

    /// Crops `region` out of `frame` and builds its score map.
    pub fn build_region(&self, frame: &RgbImage, region: Region) -> TrackerResult<ScoreMap> {
        let sub_frame = region.crop(frame);
        self.build(&sub_frame, region.origin())
    }

    /// Same result as [`build`](Self::build), computed on up to `workers` blocking tasks.
    pub async fn build_parallel(
        &self,
        sub_frame: Arc<RgbImage>,
        origin: Coordinate,
        workers: usize,
    ) -> TrackerResult<ScoreMap> {
        let height = sub_frame.height();
        // Clamp while still `usize` so an oversized request can not truncate to zero.
        let workers = workers.clamp(1, height.max(1) as usize) as u32;
        let rows_per_band = height.div_ceil(workers).max(1);

        let tasks = (0..height).step_by(rows_per_band as usize).map(|start| {
            let rows = start..(start + rows_per_band).min(height);
            let matcher = self.matcher.clone();
            let sub_frame = Arc::clone(&sub_frame);
            tokio::task::spawn_blocking(move || score_rows(&matcher, &sub_frame, origin, rows))
        });

        // Barrier: every band must finish before any of them is merged.
        let bands = join_all(tasks).await;

        let mut map = ScoreMap::new();
        for band in bands {
            let band = band.map_err(|e| TrackerError::Worker(e.to_string()))??;
            map.merge(band)?;
        }
        tracing::trace!(entries = map.len(), workers, "parallel score map built");
        Ok(map)
    }

    /// Parallel variant of [`build_region`](Self::build_region).
    pub async fn build_region_parallel(
        &self,
        frame: &RgbImage,
        region: Region,
        workers: usize,
    ) -> TrackerResult<ScoreMap> {
        let sub_frame = Arc::new(region.crop(frame));
        self.build_parallel(sub_frame, region.origin(), workers).await
    }
}

fn score_rows(
    matcher: &ColorMatcher,
    sub_frame: &RgbImage,
    origin: Coordinate,
    rows: Range<u32>,
) -> TrackerResult<ScoreMap> {
    let mut map = ScoreMap::new();
    for r in rows {
        for c in 0..sub_frame.width() {
            let pixel = Pixel::from(sub_frame.get_pixel(c, r));
            let key = Coordinate::new(c as i32 + origin.x, r as i32 + origin.y);
            map.insert(key, matcher.score(&pixel))?;
        }
    }
    Ok(map)
}
