// Overlay drawing for visual inspection. Nothing here feeds back into tracking.

use crate::core_modules::centroid::Centroid;
use crate::core_modules::search_window::Region;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

pub const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const WINDOW_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// What to draw on top of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotations {
    /// The tracked center for this frame.
    pub center: Centroid,
    /// The region that was scanned for this frame.
    pub window: Option<Region>,
}

/// Draws the window outline and a cross on the center. Anything off the frame is clipped.
pub fn draw_annotations(frame: &mut RgbImage, annotations: &Annotations) {
    // `Rect` can not be zero-sized.
    if let Some(window) = annotations.window.filter(|w| !w.is_empty()) {
        let outline = Rect::at(window.x as i32, window.y as i32).of_size(window.width, window.height);
        draw_hollow_rect_mut(frame, outline, WINDOW_COLOR);
    }

    let Centroid { x, y } = annotations.center;
    draw_cross_mut(frame, CENTER_COLOR, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_outline_and_center() {
        let mut frame = RgbImage::new(10, 10);
        draw_annotations(
            &mut frame,
            &Annotations {
                center: Centroid::new(5, 5),
                window: Some(Region::new(2, 2, 6, 6)),
            },
        );
        assert_eq!(*frame.get_pixel(2, 2), WINDOW_COLOR);
        assert_eq!(*frame.get_pixel(7, 7), WINDOW_COLOR);
        assert_eq!(*frame.get_pixel(7, 4), WINDOW_COLOR);
        assert_eq!(*frame.get_pixel(3, 3), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(5, 5), CENTER_COLOR);
        assert_eq!(*frame.get_pixel(6, 5), CENTER_COLOR);
        assert_eq!(*frame.get_pixel(5, 4), CENTER_COLOR);
        assert_eq!(*frame.get_pixel(6, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn markers_off_the_frame_are_clipped() {
        let mut frame = RgbImage::new(4, 4);
        draw_annotations(
            &mut frame,
            &Annotations {
                center: Centroid::new(-1, 0),
                window: None,
            },
        );
        assert_eq!(*frame.get_pixel(0, 0), CENTER_COLOR);
        assert_eq!(*frame.get_pixel(1, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn empty_window_draws_only_the_center() {
        let mut frame = RgbImage::new(4, 4);
        draw_annotations(
            &mut frame,
            &Annotations {
                center: Centroid::new(2, 2),
                window: Some(Region::new(0, 0, 0, 3)),
            },
        );
        assert!(frame.pixels().all(|p| *p != WINDOW_COLOR));
        assert_eq!(*frame.get_pixel(2, 2), CENTER_COLOR);
    }
}
