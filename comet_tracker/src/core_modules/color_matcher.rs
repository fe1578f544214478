// THEORY:
// The `ColorMatcher` is the only place where a pixel is compared against the
// reference color. Every other stage of the tracker works on the scores it
// produces, never on raw channels.
//
// The comparison is a dot product normalised two ways:
// - `dm` divides by the reference's magnitude term, so it grows with the
//   pixel's brightness along the reference direction.
// - `da` divides by the geometric mean of both magnitude terms, so it behaves
//   like a cosine: it rewards pixels pointing the same way as the reference.
// A pixel only scores if both land strictly inside their calibrated bands, and
// the score is then `da * dm`. Anything else is exactly `0.0`.
//
// The magnitude terms come in two flavors (`MagnitudeRule`). `LiteralXor` is the
// expression the shipped bands were calibrated against; `Squared` is the true
// squared magnitude. The two give values orders of magnitude apart, so the bands
// must be recalibrated when switching.

use crate::core_modules::pixel::pixel::Pixel;
use serde::{Deserialize, Serialize};

/// Lower clamp for the pixel's magnitude term, so black pixels never divide by zero.
pub const MIN_PIXEL_MAGNITUDE: f64 = 0.1;

pub type Score = f64;

/// An exclusive `(low, high)` acceptance band for one similarity metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub low: f64,
    pub high: f64,
}

impl ThresholdBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `low < value < high`. NaN is never contained.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.low < value && value < self.high
    }

    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }
}

/// How the per-channel magnitude terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeRule {
    /// `r ^ (2 + g) ^ (2 + b) ^ 2` on integers, matching the calibrated constants.
    #[default]
    LiteralXor,
    /// `r² + g² + b²`.
    Squared,
}

impl MagnitudeRule {
    #[inline]
    pub fn magnitude(&self, pixel: &Pixel) -> f64 {
        match self {
            MagnitudeRule::LiteralXor => pixel.literal_xor_magnitude() as f64,
            MagnitudeRule::Squared => pixel.sum_of_squares() as f64,
        }
    }
}

/// The two normalised similarity metrics for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub dm: f64,
    pub da: f64,
}

/// Scores pixels against a fixed reference color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatcher {
    reference: Pixel,
    dm_band: ThresholdBand,
    da_band: ThresholdBand,
    rule: MagnitudeRule,
    /// Cached magnitude term of the reference color.
    reference_magnitude: f64,
}

impl ColorMatcher {
    pub fn new(reference: Pixel, dm_band: ThresholdBand, da_band: ThresholdBand, rule: MagnitudeRule) -> Self {
        Self {
            reference,
            dm_band,
            da_band,
            rule,
            reference_magnitude: rule.magnitude(&reference),
        }
    }

    pub fn reference(&self) -> Pixel {
        self.reference
    }

    pub fn rule(&self) -> MagnitudeRule {
        self.rule
    }

    /// Computes `dm` and `da` for a pixel without applying the bands.
    pub fn similarity(&self, pixel: &Pixel) -> Similarity {
        let dot = pixel.dot(&self.reference) as f64;
        let pixel_magnitude = self.rule.magnitude(pixel).max(MIN_PIXEL_MAGNITUDE);
        Similarity {
            dm: dot / self.reference_magnitude,
            da: dot / (self.reference_magnitude * pixel_magnitude).sqrt(),
        }
    }

    /// `da * dm` when both metrics are inside their bands, otherwise `0.0`.
    #[inline]
    pub fn score(&self, pixel: &Pixel) -> Score {
        let Similarity { dm, da } = self.similarity(pixel);
        if self.dm_band.contains(dm) && self.da_band.contains(da) {
            da * dm
        } else {
            0.0
        }
    }
}

/// One-shot form of [`ColorMatcher::score`].
pub fn score(
    pixel: &Pixel,
    reference: &Pixel,
    dm_band: ThresholdBand,
    da_band: ThresholdBand,
    rule: MagnitudeRule,
) -> Score {
    ColorMatcher::new(*reference, dm_band, da_band, rule).score(pixel)
}
