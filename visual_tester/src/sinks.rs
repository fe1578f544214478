use comet_tracker::TrackerResult;
use comet_tracker::frame_source::FrameSink;
use comet_tracker::overlay::{Annotations, draw_annotations};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Writes each annotated frame as `frame_000000.png`, `frame_000001.png`, ...
pub struct PngSequenceSink {
    dir: PathBuf,
    next_index: u64,
}

impl PngSequenceSink {
    pub fn create(dir: impl Into<PathBuf>) -> TrackerResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, next_index: 0 })
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }
}

impl FrameSink for PngSequenceSink {
    fn render_frame(&mut self, frame: &RgbImage, annotations: &Annotations) -> TrackerResult<()> {
        let mut annotated = frame.clone();
        draw_annotations(&mut annotated, annotations);
        let path = self.dir.join(format!("frame_{:06}.png", self.next_index));
        save(&path, &annotated)?;
        self.next_index += 1;
        Ok(())
    }
}

pub fn save(path: &Path, frame: &RgbImage) -> Result<(), image::error::ImageError> {
    let output = BufWriter::new(std::fs::File::create(path)?);
    let encoder = image::codecs::png::PngEncoder::new(output);

    encoder.write_image(frame.as_raw(), frame.width(), frame.height(), ExtendedColorType::Rgb8)?;

    Ok(())
}

/// Forwards every frame to several sinks; any one of them can ask to quit.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn FrameSink>>,
}

impl FanoutSink {
    pub fn push(&mut self, sink: Box<dyn FrameSink>) {
        self.sinks.push(sink);
    }
}

impl FrameSink for FanoutSink {
    fn render_frame(&mut self, frame: &RgbImage, annotations: &Annotations) -> TrackerResult<()> {
        for sink in &mut self.sinks {
            sink.render_frame(frame, annotations)?;
        }
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        // Poll every sink so each one gets to pump its own events.
        self.sinks
            .iter_mut()
            .fold(false, |quit, sink| sink.quit_requested() || quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_tracker::core_modules::centroid::Centroid;
    use comet_tracker::core_modules::search_window::Region;
    use comet_tracker::overlay::{CENTER_COLOR, WINDOW_COLOR};

    #[test]
    fn writes_numbered_annotated_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PngSequenceSink::create(dir.path().join("out")).unwrap();
        let annotations = Annotations {
            center: Centroid::new(4, 4),
            window: Some(Region::new(1, 1, 7, 7)),
        };
        let frame = RgbImage::new(10, 10);
        sink.render_frame(&frame, &annotations).unwrap();
        sink.render_frame(&frame, &annotations).unwrap();
        assert_eq!(sink.frames_written(), 2);

        let written = image::open(dir.path().join("out/frame_000001.png")).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (10, 10));
        assert_eq!(*written.get_pixel(4, 4), CENTER_COLOR);
        assert_eq!(*written.get_pixel(1, 1), WINDOW_COLOR);
    }

    struct QuitAfter(u32);

    impl FrameSink for QuitAfter {
        fn render_frame(&mut self, _frame: &RgbImage, _annotations: &Annotations) -> TrackerResult<()> {
            self.0 = self.0.saturating_sub(1);
            Ok(())
        }

        fn quit_requested(&mut self) -> bool {
            self.0 == 0
        }
    }

    #[test]
    fn fanout_quits_when_any_sink_quits() {
        let mut fanout = FanoutSink::default();
        fanout.push(Box::new(QuitAfter(5)));
        fanout.push(Box::new(QuitAfter(1)));
        assert!(!fanout.quit_requested());

        let annotations = Annotations {
            center: Centroid::new(0, 0),
            window: None,
        };
        fanout.render_frame(&RgbImage::new(1, 1), &annotations).unwrap();
        assert!(fanout.quit_requested());
    }
}
