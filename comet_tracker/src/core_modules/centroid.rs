// THEORY:
// The centroid estimator collapses a score map into one position: the
// score-weighted mean of its coordinates, the map's "center of mass".
//
// A map with no weight (empty, or every score zero) has no center of mass. The
// estimator answers `(0, 0)` for it instead of dividing by zero. Callers that
// fuse centroids should know this pulls the fused position toward the origin.

use crate::core_modules::score_map::ScoreMap;
use serde::{Deserialize, Serialize};

/// An integer position in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

impl Centroid {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Centroid {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Score-weighted mean coordinate, truncated toward zero; `(0, 0)` when the map carries no weight.
pub fn centroid(map: &ScoreMap) -> Centroid {
    let mut weighted_x = 0.0;
    let mut weighted_y = 0.0;
    let mut total = 0.0;
    for (coordinate, score) in map.iter() {
        weighted_x += score * coordinate.x as f64;
        weighted_y += score * coordinate.y as f64;
        total += score;
    }

    if total <= 0.0 {
        return Centroid::default();
    }

    Centroid::new((weighted_x / total).trunc() as i32, (weighted_y / total).trunc() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::score_map::Coordinate;

    fn map(entries: &[((i32, i32), f64)]) -> ScoreMap {
        entries.iter().map(|(c, s)| (Coordinate::from(*c), *s)).collect()
    }

    #[test]
    fn empty_and_all_zero_maps_fall_back_to_origin() {
        assert_eq!(centroid(&ScoreMap::new()), Centroid::new(0, 0));
        assert_eq!(centroid(&map(&[((40, 50), 0.0), ((41, 50), 0.0)])), Centroid::new(0, 0));
    }

    #[test]
    fn single_point_is_its_own_centroid() {
        for weight in [0.001, 1.0, 136_229.0] {
            assert_eq!(centroid(&map(&[((309, 96), weight)])), Centroid::new(309, 96));
        }
    }

    #[test]
    fn weights_pull_the_mean() {
        let m = map(&[((0, 0), 1.0), ((10, 0), 3.0), ((5, 20), 0.0)]);
        // x = 30 / 4 = 7.5 -> 7
        assert_eq!(centroid(&m), Centroid::new(7, 0));
    }

    #[test]
    fn result_is_truncated() {
        let m = map(&[((1, 1), 1.0), ((2, 2), 2.0)]);
        // 5 / 3 = 1.67 -> 1
        assert_eq!(centroid(&m), Centroid::new(1, 1));
    }
}
