// THEORY:
// Fusion combines the three per-frame position estimates into the single
// position the window moves to. Each estimate fails differently: the color
// centroid is dragged by any similar-colored clutter in the window, the shape
// centroid lags and collapses to the origin when nothing overlaps, and the
// motion centroid sits on the leading edge. The weights trade these off; motion
// carries the most weight by default.

use crate::core_modules::centroid::Centroid;
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub color: f64,
    pub shape: f64,
    pub motion: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            color: 0.25,
            shape: 0.25,
            motion: 0.50,
        }
    }
}

impl FusionWeights {
    pub fn new(color: f64, shape: f64, motion: f64) -> Self {
        Self { color, shape, motion }
    }

    pub fn sum(&self) -> f64 {
        self.color + self.shape + self.motion
    }

    /// Weights must be finite, non-negative, and sum to 1.
    pub fn is_valid(&self) -> bool {
        [self.color, self.shape, self.motion]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
            && (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Weighted sum of the three centroids, rounded half-to-even per axis.
    pub fn fuse(&self, color: Centroid, shape: Centroid, motion: Centroid) -> Centroid {
        let axis = |c: i32, s: i32, m: i32| {
            (self.color * c as f64 + self.shape * s as f64 + self.motion * m as f64).round_ties_even() as i32
        };
        Centroid::new(
            axis(color.x, shape.x, motion.x),
            axis(color.y, shape.y, motion.y),
        )
    }
}
