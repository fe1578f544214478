// THEORY:
// The `TrackerLoop` is the top-level orchestrator of the tracker. It owns the
// only mutable state of a run, the previous frame's score map and the search
// window, and advances both once per frame.
//
// Key architectural principles:
// 1.  **Two States**: The loop starts in `Init`. The first frame only seeds the
//     previous map; there is nothing to compare against yet, so no centroid is
//     computed and the window does not move. Every later frame is `Tracking`.
// 2.  **Three Opinions, One Answer**: Each tracking frame produces three
//     centroids (raw color, shape, motion) from the same current map and fuses
//     them with fixed weights into the next window center.
// 3.  **Owned State**: Nothing is global. Two loops built from the same config
//     track independently.
// 4.  **Clean Stops**: Running out of frames, failing to read a frame, and a
//     quit request all end a run normally. Only invariant faults (and sink
//     failures) come back as errors.

use crate::config::TrackerConfig;
use crate::core_modules::centroid::{Centroid, centroid};
use crate::core_modules::score_map::ScoreMap;
use crate::core_modules::search_window::{Region, SearchWindow};
use crate::core_modules::shape_filter;
use crate::core_modules::window_color_map::WindowColorMap;
use crate::error::{TrackerError, TrackerResult};
use crate::frame_source::{FrameSink, FrameSource};
use crate::overlay::Annotations;
use image::RgbImage;

/// Where the loop is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerState {
    /// No previous map yet.
    Init,
    /// Steady per-frame fusion against the previous map.
    Tracking { previous: ScoreMap },
}

/// Everything computed for one tracking frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingUpdate {
    /// Centroid of the raw color map.
    pub color: Centroid,
    /// Centroid of the shape-filtered map.
    pub shape: Centroid,
    /// Centroid of the motion-filtered map.
    pub motion: Centroid,
    /// The weighted fusion of the three centroids.
    pub fused: Centroid,
    /// The new window center: `fused`, pulled onto the frame if needed.
    pub center: Centroid,
    /// The region that was scanned for this frame.
    pub region: Region,
}

/// The output of the loop for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReport {
    /// First frame: the previous map was seeded, the window did not move.
    Seeded { center: Centroid, region: Region },
    Tracked(TrackingUpdate),
}

impl FrameReport {
    /// The window center after this frame.
    pub fn center(&self) -> Centroid {
        match self {
            FrameReport::Seeded { center, .. } => *center,
            FrameReport::Tracked(update) => update.center,
        }
    }

    pub fn region(&self) -> Region {
        match self {
            FrameReport::Seeded { region, .. } => *region,
            FrameReport::Tracked(update) => update.region,
        }
    }

    pub fn annotations(&self) -> Annotations {
        Annotations {
            center: self.center(),
            window: Some(self.region()),
        }
    }
}

/// Why a run ended. All of these are normal stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    /// A frame could not be read; treated as the end of the stream.
    ReadFailed,
    /// The sink asked to quit.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub stop_reason: StopReason,
    pub final_center: Centroid,
}

/// The main, top-level struct for the tracker.
pub struct TrackerLoop {
    config: TrackerConfig,
    builder: WindowColorMap,
    window: SearchWindow,
    state: TrackerState,
    /// Window centers produced by tracking frames, in order.
    trajectory: Vec<Centroid>,
    frames_processed: u64,
}

impl TrackerLoop {
    pub fn new(config: TrackerConfig) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            builder: WindowColorMap::new(config.matcher()),
            window: SearchWindow::new(config.initial_center, config.window_width, config.window_height),
            state: TrackerState::Init,
            trajectory: Vec::new(),
            frames_processed: 0,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn center(&self) -> Centroid {
        self.window.center()
    }

    pub fn window(&self) -> &SearchWindow {
        &self.window
    }

    pub fn trajectory(&self) -> &[Centroid] {
        &self.trajectory
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Back to `Init` at the configured starting center.
    pub fn reset(&mut self) {
        self.window.recenter(self.config.initial_center);
        self.state = TrackerState::Init;
        self.trajectory.clear();
        self.frames_processed = 0;
    }

    /// Runs one frame through the tracker.
    pub fn process_frame(&mut self, frame: &RgbImage) -> TrackerResult<FrameReport> {
        let region = self.scan_region(frame)?;
        let current = self.builder.build_region(frame, region)?;
        Ok(self.advance(current, region, frame.dimensions()))
    }

    /// [`process_frame`](Self::process_frame) with the window scored on `workers` blocking tasks.
    pub async fn process_frame_parallel(&mut self, frame: &RgbImage, workers: usize) -> TrackerResult<FrameReport> {
        let region = self.scan_region(frame)?;
        let current = self.builder.build_region_parallel(frame, region, workers).await?;
        Ok(self.advance(current, region, frame.dimensions()))
    }

    /// Pulls frames from `source` until it runs dry, fails, or `sink` asks to quit.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> TrackerResult<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        self.log_run_start(None);
        let stop_reason = loop {
            let frame = match next_frame(source, sink) {
                Ok(frame) => frame,
                Err(reason) => break reason,
            };
            let report = self.process_frame(&frame)?;
            render(sink, frame, &report)?;
        };
        Ok(self.finish(stop_reason))
    }

    /// [`run`](Self::run) using the parallel window builder.
    pub async fn run_parallel<S, K>(&mut self, source: &mut S, sink: &mut K, workers: usize) -> TrackerResult<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        self.log_run_start(Some(workers));
        let stop_reason = loop {
            let frame = match next_frame(source, sink) {
                Ok(frame) => frame,
                Err(reason) => break reason,
            };
            let report = self.process_frame_parallel(&frame, workers).await?;
            render(sink, frame, &report)?;
        };
        Ok(self.finish(stop_reason))
    }

    fn scan_region(&mut self, frame: &RgbImage) -> TrackerResult<Region> {
        let (width, height) = frame.dimensions();
        let before = self.window.center();
        if self.window.clamp_to(width, height) {
            tracing::warn!(
                from = ?before,
                to = ?self.window.center(),
                "search window center was outside the frame, clamped"
            );
        }
        self.window
            .region_within(width, height)
            .ok_or(TrackerError::WindowOutsideFrame {
                center_x: self.window.center().x,
                center_y: self.window.center().y,
                frame_width: width,
                frame_height: height,
            })
    }

    fn advance(&mut self, current: ScoreMap, region: Region, (width, height): (u32, u32)) -> FrameReport {
        self.frames_processed += 1;
        tracing::trace!(
            entries = current.len(),
            hits = current.hits(),
            total = current.total(),
            "score map built"
        );

        let previous = match std::mem::replace(&mut self.state, TrackerState::Init) {
            TrackerState::Init => {
                self.state = TrackerState::Tracking { previous: current };
                tracing::debug!(center = ?self.window.center(), "seeded previous score map");
                return FrameReport::Seeded {
                    center: self.window.center(),
                    region,
                };
            }
            TrackerState::Tracking { previous } => previous,
        };

        let color = centroid(&current);
        let shape = centroid(&shape_filter::apply(&current, &previous));
        let motion = centroid(&self.config.motion_filter.apply(&current, &previous));
        let fused = self.config.fusion_weights.fuse(color, shape, motion);

        self.window.recenter(fused);
        if self.window.clamp_to(width, height) {
            tracing::warn!(fused = ?fused, center = ?self.window.center(), "fused center left the frame, clamped");
        }
        let center = self.window.center();
        self.trajectory.push(center);
        self.state = TrackerState::Tracking { previous: current };

        tracing::debug!(
            frame = self.frames_processed,
            color = ?color,
            shape = ?shape,
            motion = ?motion,
            center = ?center,
            "tracked"
        );

        FrameReport::Tracked(TrackingUpdate {
            color,
            shape,
            motion,
            fused,
            center,
            region,
        })
    }

    fn log_run_start(&self, workers: Option<usize>) {
        tracing::info!(
            center = ?self.window.center(),
            window_width = self.window.width(),
            window_height = self.window.height(),
            rule = ?self.config.magnitude_rule,
            workers = ?workers,
            "tracker run started"
        );
    }

    fn finish(&self, stop_reason: StopReason) -> RunSummary {
        let summary = RunSummary {
            frames_processed: self.frames_processed,
            stop_reason,
            final_center: self.window.center(),
        };
        tracing::info!(
            frames = summary.frames_processed,
            reason = ?summary.stop_reason,
            center = ?summary.final_center,
            "tracker run finished"
        );
        summary
    }
}

/// Reads the next frame and polls for a quit request; `Err` carries the reason to stop.
fn next_frame<S, K>(source: &mut S, sink: &mut K) -> Result<RgbImage, StopReason>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
{
    let frame = match source.read_frame() {
        Ok(Some(frame)) => frame,
        Ok(None) => return Err(StopReason::EndOfStream),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read frame, treating as end of stream");
            return Err(StopReason::ReadFailed);
        }
    };
    if sink.quit_requested() {
        tracing::info!("quit requested");
        return Err(StopReason::Cancelled);
    }
    Ok(frame)
}

fn render<K: FrameSink + ?Sized>(sink: &mut K, frame: RgbImage, report: &FrameReport) -> TrackerResult<()> {
    sink.render_frame(&frame, &report.annotations())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::frame_source::{IterSource, NullSink};
    use image::Rgb;

    const REFERENCE: Pixel = Pixel::new(125, 125, 125);

    fn small_config() -> TrackerConfig {
        TrackerConfig {
            initial_center: Centroid::new(2, 2),
            window_width: 4,
            window_height: 4,
            ..TrackerConfig::default()
        }
    }

    /// A black frame with one reference-colored pixel.
    fn frame_with_dot(width: u32, height: u32, x: u32, y: u32) -> RgbImage {
        let mut frame = RgbImage::new(width, height);
        frame.put_pixel(x, y, REFERENCE.into());
        frame
    }

    #[test]
    fn init_frame_seeds_without_moving_the_window() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        let report = tracker.process_frame(&frame_with_dot(4, 4, 1, 1)).unwrap();

        assert_eq!(
            report,
            FrameReport::Seeded {
                center: Centroid::new(2, 2),
                region: Region::new(0, 0, 4, 4),
            }
        );
        assert_eq!(tracker.center(), Centroid::new(2, 2));
        assert!(tracker.trajectory().is_empty());
        assert!(matches!(tracker.state(), TrackerState::Tracking { .. }));
    }

    #[test]
    fn moving_dot_pulls_the_window_toward_it() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        tracker.process_frame(&frame_with_dot(4, 4, 1, 1)).unwrap();
        let report = tracker.process_frame(&frame_with_dot(4, 4, 2, 1)).unwrap();

        let FrameReport::Tracked(update) = report else {
            panic!("second frame must track, got {report:?}");
        };
        assert_eq!(update.color, Centroid::new(2, 1));
        // The dot does not overlap its previous position, so the shape map is empty.
        assert_eq!(update.shape, Centroid::new(0, 0));
        assert_eq!(update.motion, Centroid::new(2, 1));
        // x: 0.25*2 + 0.25*0 + 0.5*2 = 1.5 -> 2, y: 0.25*1 + 0.5*1 = 0.75 -> 1
        assert_eq!(update.fused, Centroid::new(2, 1));
        assert_eq!(tracker.center(), Centroid::new(2, 1));
        assert_eq!(tracker.trajectory(), &[Centroid::new(2, 1)]);
    }

    #[test]
    fn stationary_dot_has_no_motion_but_keeps_shape() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        tracker.process_frame(&frame_with_dot(4, 4, 3, 3)).unwrap();
        let FrameReport::Tracked(update) = tracker.process_frame(&frame_with_dot(4, 4, 3, 3)).unwrap() else {
            panic!("expected tracking");
        };
        assert_eq!(update.color, Centroid::new(3, 3));
        assert_eq!(update.shape, Centroid::new(3, 3));
        assert_eq!(update.motion, Centroid::new(0, 0));
        // 0.25*3 + 0.25*3 = 1.5 -> 2
        assert_eq!(update.center, Centroid::new(2, 2));
    }

    #[test]
    fn off_frame_initial_center_is_clamped() {
        // The default starting center is far outside a 4x4 frame.
        let config = TrackerConfig {
            window_width: 4,
            window_height: 4,
            ..TrackerConfig::default()
        };
        let mut tracker = TrackerLoop::new(config).unwrap();
        let report = tracker.process_frame(&frame_with_dot(4, 4, 0, 0)).unwrap();
        assert_eq!(report.center(), Centroid::new(3, 3));
        assert_eq!(report.region(), Region::new(1, 1, 3, 3));
    }

    #[test]
    fn empty_frame_is_a_window_error() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        assert!(matches!(
            tracker.process_frame(&RgbImage::new(0, 0)),
            Err(TrackerError::WindowOutsideFrame { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = TrackerConfig {
            window_width: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(TrackerLoop::new(config), Err(TrackerError::InvalidConfig(_))));
    }

    #[test]
    fn reset_returns_to_init() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        tracker.process_frame(&frame_with_dot(4, 4, 1, 1)).unwrap();
        tracker.process_frame(&frame_with_dot(4, 4, 2, 1)).unwrap();
        tracker.reset();
        assert_eq!(tracker.state(), &TrackerState::Init);
        assert_eq!(tracker.center(), Centroid::new(2, 2));
        assert!(tracker.trajectory().is_empty());
        assert_eq!(tracker.frames_processed(), 0);
    }

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<Annotations>,
        quit_after: Option<usize>,
    }

    impl FrameSink for RecordingSink {
        fn render_frame(&mut self, _frame: &RgbImage, annotations: &Annotations) -> TrackerResult<()> {
            self.frames.push(*annotations);
            Ok(())
        }

        fn quit_requested(&mut self) -> bool {
            self.quit_after.is_some_and(|n| self.frames.len() >= n)
        }
    }

    fn moving_dot_frames(count: u32) -> Vec<RgbImage> {
        (0..count).map(|i| frame_with_dot(8, 8, 1 + i % 3, 2)).collect()
    }

    #[test]
    fn run_stops_at_end_of_stream() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        let mut sink = RecordingSink::default();
        let summary = tracker.run(&mut IterSource::new(moving_dot_frames(5)), &mut sink).unwrap();

        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(summary.frames_processed, 5);
        assert_eq!(sink.frames.len(), 5);
        assert_eq!(tracker.trajectory().len(), 4);
        assert_eq!(summary.final_center, tracker.center());
    }

    #[test]
    fn run_stops_when_sink_quits() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        let mut sink = RecordingSink {
            quit_after: Some(2),
            ..RecordingSink::default()
        };
        let summary = tracker.run(&mut IterSource::new(moving_dot_frames(5)), &mut sink).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.frames_processed, 2);
    }

    struct FailingSource {
        good_frames: u32,
    }

    impl FrameSource for FailingSource {
        fn read_frame(&mut self) -> TrackerResult<Option<RgbImage>> {
            if self.good_frames == 0 {
                return Err(TrackerError::Io(std::io::Error::other("decoder went away")));
            }
            self.good_frames -= 1;
            Ok(Some(frame_with_dot(4, 4, 1, 1)))
        }
    }

    #[test]
    fn read_failure_is_a_clean_stop() {
        let mut tracker = TrackerLoop::new(small_config()).unwrap();
        let summary = tracker.run(&mut FailingSource { good_frames: 3 }, &mut NullSink).unwrap();
        assert_eq!(summary.stop_reason, StopReason::ReadFailed);
        assert_eq!(summary.frames_processed, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn parallel_run_matches_sequential_run() {
        let mut sequential = TrackerLoop::new(small_config()).unwrap();
        sequential
            .run(&mut IterSource::new(moving_dot_frames(7)), &mut NullSink)
            .unwrap();

        let mut parallel = TrackerLoop::new(small_config()).unwrap();
        let summary = parallel
            .run_parallel(&mut IterSource::new(moving_dot_frames(7)), &mut NullSink, 3)
            .await
            .unwrap();

        assert_eq!(summary.frames_processed, 7);
        assert_eq!(parallel.trajectory(), sequential.trajectory());
    }

    #[test]
    fn larger_blob_is_followed_across_frames() {
        let config = TrackerConfig {
            initial_center: Centroid::new(20, 20),
            window_width: 20,
            window_height: 20,
            ..TrackerConfig::default()
        };
        let mut tracker = TrackerLoop::new(config).unwrap();
        let frames: Vec<RgbImage> = (0..6)
            .map(|step| {
                let mut frame = RgbImage::from_pixel(64, 64, Rgb([5, 5, 30]));
                for dy in 0..4 {
                    for dx in 0..4 {
                        frame.put_pixel(18 + step + dx, 18 + dy, REFERENCE.into());
                    }
                }
                frame
            })
            .collect();
        tracker.run(&mut IterSource::new(frames), &mut NullSink).unwrap();

        let last = *tracker.trajectory().last().unwrap();
        // The blob ends at x in 23..27; the window must have moved right of its start.
        assert!(last.x > 20, "window did not follow the blob: {last:?}");
        assert!((last.y - 19).abs() <= 2, "window drifted vertically: {last:?}");
    }
}
