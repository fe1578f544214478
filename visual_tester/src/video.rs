// OpenCV-backed frame source and display window. Only built with `--features opencv`.

use comet_tracker::frame_source::{FrameSink, FrameSource};
use comet_tracker::overlay::{Annotations, draw_annotations};
use comet_tracker::{TrackerError, TrackerResult};
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

const QUIT_KEY: char = 'q';
const KEY_POLL_MILLIS: i32 = 15;

fn cv_error(e: opencv::Error) -> TrackerError {
    TrackerError::Io(std::io::Error::other(e.to_string()))
}

/// Decodes a video file frame by frame.
pub struct VideoSource {
    capture: VideoCapture,
}

impl VideoSource {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let capture = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            anyhow::bail!("could not open video {}", path.display());
        }
        Ok(Self { capture })
    }
}

impl FrameSource for VideoSource {
    fn read_frame(&mut self) -> TrackerResult<Option<RgbImage>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame).map_err(cv_error)? || frame.empty() {
            return Ok(None);
        }

        // OpenCV decodes to BGR; the tracker expects RGB.
        let mut rgb = Mat::default();
        imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(cv_error)?;
        let bytes = rgb.data_bytes().map_err(cv_error)?.to_vec();

        RgbImage::from_raw(rgb.cols() as u32, rgb.rows() as u32, bytes)
            .map(Some)
            .ok_or_else(|| TrackerError::Io(std::io::Error::other("decoded frame has an unexpected size")))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.capture.release();
    }
}

/// Shows annotated frames in a HighGUI window; pressing `q` stops the run.
pub struct WindowSink {
    name: String,
}

impl WindowSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl FrameSink for WindowSink {
    fn render_frame(&mut self, frame: &RgbImage, annotations: &Annotations) -> TrackerResult<()> {
        let mut annotated = frame.clone();
        draw_annotations(&mut annotated, annotations);

        let mut rgb = Mat::new_rows_cols_with_default(
            annotated.height() as i32,
            annotated.width() as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )
        .map_err(cv_error)?;
        rgb.data_bytes_mut().map_err(cv_error)?.copy_from_slice(annotated.as_raw());

        // HighGUI expects BGR.
        let mut bgr = Mat::default();
        imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0).map_err(cv_error)?;

        highgui::imshow(&self.name, &bgr).map_err(cv_error)
    }

    fn quit_requested(&mut self) -> bool {
        match highgui::wait_key(KEY_POLL_MILLIS) {
            Ok(key) => key == QUIT_KEY as i32,
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll keyboard");
                false
            }
        }
    }
}

impl Drop for WindowSink {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}
