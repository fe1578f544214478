// THEORY:
// The `Pixel` module is the most fundamental building block of the tracker.
// It is a "dumb" data container for a single RGB pixel plus the handful of
// single-pixel quantities the color matcher needs: the channel-wise dot product
// with another color and the two magnitude terms used to normalise it.
//
// Key architectural principles:
// 1.  **Data Purity**: It holds the raw `u8` channel values without any interpretation.
//     Channel order is fixed (red, green, blue) for every frame source.
// 2.  **Intrinsic Knowledge**: Methods only use the pixel's own channels, or the
//     channels of one other color passed in explicitly. Anything that needs a
//     neighborhood or a previous frame lives in the score map modules.
// 3.  **Wide Arithmetic**: All products and sums are computed in `i64` so a
//     saturated 255-valued pixel can never overflow.

pub mod pixel {
    use image::Rgb;
    use serde::{Deserialize, Serialize};

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type WideChannel = i64;

    pub const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// The channels widened for overflow-free arithmetic, in R, G, B order.
        #[inline]
        pub fn wide_channels(&self) -> [WideChannel; CHANNELS] {
            [
                self.red as WideChannel,
                self.green as WideChannel,
                self.blue as WideChannel,
            ]
        }

        /// Channel-wise dot product with another color.
        #[inline]
        pub fn dot(&self, other: &Pixel) -> WideChannel {
            self.wide_channels()
                .iter()
                .zip(other.wide_channels().iter())
                .map(|(a, b)| a * b)
                .sum()
        }

        /// Squared Euclidean magnitude, `r² + g² + b²`.
        #[inline]
        pub fn sum_of_squares(&self) -> WideChannel {
            self.wide_channels().iter().map(|c| c * c).sum()
        }

        /// The calibrated magnitude term, `r ^ 2 + g ^ 2 + b ^ 2` read with
        /// addition binding tighter than XOR: `r ^ (2 + g) ^ (2 + b) ^ 2`.
        #[inline]
        pub fn literal_xor_magnitude(&self) -> WideChannel {
            let [r, g, b] = self.wide_channels();
            r ^ (2 + g) ^ (2 + b) ^ 2
        }
    }

    impl From<Rgb<Byte>> for Pixel {
        fn from(rgb: Rgb<Byte>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<&Rgb<Byte>> for Pixel {
        fn from(rgb: &Rgb<Byte>) -> Self {
            Pixel::from(*rgb)
        }
    }

    impl From<Pixel> for Rgb<Byte> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}
