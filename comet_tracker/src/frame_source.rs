// THEORY:
// The tracker never decodes video itself. It talks to two collaborators:
// - a `FrameSource`, which hands over one RGB frame at a time and says when the
//   stream is over, and
// - a `FrameSink`, which receives each frame with its annotations for display
//   and is polled (without blocking) for a quit request.
// Releasing a source is just dropping it.

use crate::error::TrackerResult;
use crate::overlay::Annotations;
use image::RgbImage;
use std::path::{Path, PathBuf};

pub trait FrameSource {
    /// The next frame, `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> TrackerResult<Option<RgbImage>>;
}

pub trait FrameSink {
    fn render_frame(&mut self, frame: &RgbImage, annotations: &Annotations) -> TrackerResult<()>;

    /// Non-blocking check for an external stop request.
    fn quit_requested(&mut self) -> bool {
        false
    }
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn render_frame(&mut self, _frame: &RgbImage, _annotations: &Annotations) -> TrackerResult<()> {
        Ok(())
    }
}

/// Adapts any iterator of frames into a [`FrameSource`].
pub struct IterSource<I> {
    frames: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = RgbImage>,
{
    pub fn new(frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            frames: frames.into_iter(),
        }
    }
}

impl<I> FrameSource for IterSource<I>
where
    I: Iterator<Item = RgbImage>,
{
    fn read_frame(&mut self) -> TrackerResult<Option<RgbImage>> {
        Ok(self.frames.next())
    }
}

/// Reads the image files of a directory, in file name order, as frames.
pub struct ImageSequenceSource {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequenceSource {
    /// Collects every file in `dir` whose extension `image` recognises.
    pub fn open(dir: impl AsRef<Path>) -> TrackerResult<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();
        tracing::info!(
            frames = paths.len(),
            dir = %dir.as_ref().display(),
            "opened image sequence"
        );
        Ok(Self {
            paths: paths.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn read_frame(&mut self) -> TrackerResult<Option<RgbImage>> {
        match self.paths.next() {
            Some(path) => {
                tracing::trace!(path = %path.display(), "decoding frame");
                Ok(Some(image::open(&path)?.to_rgb8()))
            }
            None => Ok(None),
        }
    }
}
