// THEORY:
// `TrackerConfig` is the immutable bundle a run is built from. Everything the
// tracker needs to know up front lives here: the reference color, the two
// acceptance bands, the search window, where to start, and how to fuse.
//
// The defaults are the calibrated constants for the comet footage the tracker
// was first tuned on. They are only meaningful together: the bands assume the
// `LiteralXor` magnitude rule and the starting center assumes that footage.
// A JSON file may override any subset of fields; missing fields take the
// defaults.

use crate::core_modules::centroid::Centroid;
use crate::core_modules::color_matcher::{ColorMatcher, MagnitudeRule, ThresholdBand};
use crate::core_modules::fusion::FusionWeights;
use crate::core_modules::motion_filter::MotionFilter;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_REFERENCE_COLOR: Pixel = Pixel::new(125, 125, 125);
pub const DEFAULT_DM_BAND: ThresholdBand = ThresholdBand::new(200.0, 600.0);
pub const DEFAULT_DA_BAND: ThresholdBand = ThresholdBand::new(200.0, 400.0);
pub const DEFAULT_INITIAL_CENTER: Centroid = Centroid::new(309, 96);
pub const DEFAULT_WINDOW_WIDTH: u32 = 60;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 60;

/// Configuration for the TrackerLoop, constant for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub reference_color: Pixel,
    pub dm_band: ThresholdBand,
    pub da_band: ThresholdBand,
    pub magnitude_rule: MagnitudeRule,
    pub window_width: u32,
    pub window_height: u32,
    pub initial_center: Centroid,
    pub fusion_weights: FusionWeights,
    pub motion_filter: MotionFilter,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reference_color: DEFAULT_REFERENCE_COLOR,
            dm_band: DEFAULT_DM_BAND,
            da_band: DEFAULT_DA_BAND,
            magnitude_rule: MagnitudeRule::default(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            initial_center: DEFAULT_INITIAL_CENTER,
            fusion_weights: FusionWeights::default(),
            motion_filter: MotionFilter::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_json_str(json: &str) -> TrackerResult<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TrackerResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if !self.dm_band.is_valid() {
            return Err(invalid(format!("dm band {:?} must be finite with low < high", self.dm_band)));
        }
        if !self.da_band.is_valid() {
            return Err(invalid(format!("da band {:?} must be finite with low < high", self.da_band)));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(invalid(format!(
                "search window must be non-empty, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        if !self.fusion_weights.is_valid() {
            return Err(invalid(format!(
                "fusion weights {:?} must be non-negative and sum to 1.0 (sum = {})",
                self.fusion_weights,
                self.fusion_weights.sum()
            )));
        }
        let MotionFilter {
            diff_threshold,
            score_threshold,
        } = self.motion_filter;
        if !diff_threshold.is_finite() || !score_threshold.is_finite() {
            return Err(invalid("motion thresholds must be finite".to_string()));
        }
        if self.magnitude_rule.magnitude(&self.reference_color) <= 0.0 {
            return Err(invalid(format!(
                "reference color {:?} has a zero magnitude under {:?}",
                self.reference_color, self.magnitude_rule
            )));
        }
        Ok(())
    }

    pub fn matcher(&self) -> ColorMatcher {
        ColorMatcher::new(self.reference_color, self.dm_band, self.da_band, self.magnitude_rule)
    }
}

fn invalid(message: String) -> TrackerError {
    TrackerError::InvalidConfig(message)
}
