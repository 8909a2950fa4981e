// THEORY:
// The `Pixel` module is the most fundamental unit of the detector. It is a "dumb"
// data container for a single RGBA sample from the working image plus the two
// single-pixel metrics every color heuristic is built on:
//
// - brightness: the plain channel mean (r + g + b) / 3, kept as a real number so
//   thresholds like `brightness > 120` compare exactly as written.
// - color_diff: the largest pairwise channel difference, a cheap proxy for
//   saturation. Gray, white and smoky pixels have a small spread.
//
// Anything that needs a neighbour or a cell lives higher up (`GridCell`,
// `GridAggregator`).

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Brightness = f64;
    pub type ColorDiff = i16;

    pub const CHANNELS: usize = 4;

    /// A single RGBA pixel sampled from the working-resolution buffer.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255). Carried, never analysed.
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Opaque pixel from RGB.
        pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel::new(red, green, blue, u8::MAX)
        }

        /// Channel mean in 0.0..=255.0.
        pub fn brightness(&self) -> Brightness {
            (self.red as f64 + self.green as f64 + self.blue as f64) / 3.0
        }

        /// max(|r - g|, |g - b|, |r - b|)
        pub fn color_diff(&self) -> ColorDiff {
            let (r, g, b) = self.signed();
            (r - g).abs().max((g - b).abs()).max((r - b).abs())
        }

        /// Channels widened to a signed type so differences cannot wrap.
        #[inline]
        pub fn signed(&self) -> (i16, i16, i16) {
            (self.red as i16, self.green as i16, self.blue as i16)
        }
    }

    impl TryFrom<&[Byte]> for Pixel {
        type Error = usize;

        /// Builds a pixel from exactly four RGBA bytes; returns the offending length otherwise.
        fn try_from(bytes: &[Byte]) -> Result<Self, Self::Error> {
            match bytes {
                [r, g, b, a] => Ok(Pixel::new(*r, *g, *b, *a)),
                _ => Err(bytes.len()),
            }
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue, pixel.alpha]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn brightness_is_channel_mean() {
        assert_eq!(Pixel::rgb(30, 60, 90).brightness(), 60.0);
        assert!((Pixel::rgb(1, 1, 2).brightness() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn color_diff_is_largest_spread() {
        assert_eq!(Pixel::rgb(200, 200, 200).color_diff(), 0);
        assert_eq!(Pixel::rgb(230, 150, 50).color_diff(), 180);
        assert_eq!(Pixel::rgb(10, 255, 0).color_diff(), 255);
    }

    #[test]
    fn converts_from_rgba_slice() {
        let bytes = [1u8, 2, 3, 4];
        let pixel = Pixel::try_from(&bytes[..]).unwrap();
        assert_eq!(pixel, Pixel::new(1, 2, 3, 4));
        assert_eq!(Pixel::try_from(&bytes[..3]), Err(3));
        assert_eq!(<[u8; 4]>::from(pixel), bytes);
    }
}
