// THEORY:
// This file is the main entry point for the `comet_tracker` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the `visual_tester` binary).
//
// The primary goal is to export the `TrackerLoop` and its associated data
// structures (`TrackerConfig`, `FrameReport`, etc.) as the clean, high-level
// interface for the tracker. The scoring and filtering stages (`core_modules`)
// stay public so they can be inspected and tested one at a time, but a caller
// only ever needs a frame source, a config, and the loop.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod overlay;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use tracker::{FrameReport, RunSummary, StopReason, TrackerLoop, TrackingUpdate};
