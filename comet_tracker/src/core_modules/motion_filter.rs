// THEORY:
// The motion filter is a change detector on score maps. Where the shape filter
// asks "was this here last frame too?", the motion filter asks "did this change
// since last frame?". A moving object leaves a trail of changed scores at its
// leading and trailing edges, and the leading edge is where the current score
// is still high.
//
// A coordinate registers motion only when:
// - it exists in both maps,
// - its score changed by more than `diff_threshold`, and
// - its current score is above `score_threshold`.
// Every other coordinate of the current map is kept with a score of `0.0`.

use crate::core_modules::score_map::ScoreMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionFilter {
    /// Minimum absolute change between frames (exclusive).
    pub diff_threshold: f64,
    /// Minimum current score (exclusive).
    pub score_threshold: f64,
}

impl MotionFilter {
    pub fn new(diff_threshold: f64, score_threshold: f64) -> Self {
        Self {
            diff_threshold,
            score_threshold,
        }
    }

    pub fn apply(&self, curr: &ScoreMap, prev: &ScoreMap) -> ScoreMap {
        curr.map_scores(|coordinate, score| match prev.get(&coordinate) {
            Some(previous)
                if (score - previous).abs() > self.diff_threshold && score > self.score_threshold =>
            {
                score
            }
            _ => 0.0,
        })
    }
}

/// [`MotionFilter::apply`] with both thresholds at zero.
pub fn apply(curr: &ScoreMap, prev: &ScoreMap) -> ScoreMap {
    MotionFilter::default().apply(curr, prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::score_map::Coordinate;

    fn map(entries: &[((i32, i32), f64)]) -> ScoreMap {
        entries.iter().map(|(c, s)| (Coordinate::from(*c), *s)).collect()
    }

    #[test]
    fn changed_scores_register_motion() {
        let curr = map(&[((0, 0), 5.0), ((1, 0), 5.0), ((2, 0), 0.0), ((3, 0), 5.0)]);
        let prev = map(&[((0, 0), 0.0), ((1, 0), 5.0), ((2, 0), 5.0)]);

        let motion = apply(&curr, &prev);

        assert_eq!(motion.get(&Coordinate::new(0, 0)), Some(5.0)); // appeared
        assert_eq!(motion.get(&Coordinate::new(1, 0)), Some(0.0)); // unchanged
        assert_eq!(motion.get(&Coordinate::new(2, 0)), Some(0.0)); // left: current score is zero
        assert_eq!(motion.get(&Coordinate::new(3, 0)), Some(0.0)); // not in previous map
        assert_eq!(motion.len(), curr.len());
    }

    #[test]
    fn thresholds_are_exclusive() {
        let curr = map(&[((0, 0), 3.0), ((1, 0), 10.0), ((2, 0), 2.0)]);
        let prev = map(&[((0, 0), 1.0), ((1, 0), 7.5), ((2, 0), 0.0)]);
        let filter = MotionFilter::new(2.0, 2.0);

        let motion = filter.apply(&curr, &prev);

        assert_eq!(motion.get(&Coordinate::new(0, 0)), Some(0.0)); // diff == 2.0
        assert_eq!(motion.get(&Coordinate::new(1, 0)), Some(10.0));
        assert_eq!(motion.get(&Coordinate::new(2, 0)), Some(0.0)); // score == 2.0
    }

    #[test]
    fn nonzero_only_for_keys_in_both_maps() {
        let curr = map(&[((0, 0), 1.0), ((0, 1), 2.0), ((0, 2), 3.0)]);
        let prev = map(&[((0, 1), 0.5)]);
        let motion = apply(&curr, &prev);
        for (coordinate, score) in motion.iter() {
            if score != 0.0 {
                assert!(prev.get(&coordinate).is_some());
            }
        }
        assert_eq!(motion.hits(), 1);
    }
}
