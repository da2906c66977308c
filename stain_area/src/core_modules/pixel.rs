// THEORY (single-pixel heuristics):
// The `Pixel` module is the smallest unit of the estimation engine. It is a "dumb"
// data container for one RGBA sample plus the one heuristic the binarizer needs:
// a weighted luminance. Nothing here knows about neighbors, masks or markers.
//
// Luminance uses the classic 0.30 / 0.59 / 0.11 weighting on the raw 0..255
// channels. Alpha never contributes; the binarizer forces it to opaque anyway.
//
// The two canonical mask values also live here so that every later stage compares
// against the same constants instead of re-typing byte literals.

pub mod pixel {
    use image::Rgba;

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;

    const CHANNELS: usize = 4;

    const RED_WEIGHT: f64 = 0.3;
    const GREEN_WEIGHT: f64 = 0.59;
    const BLUE_WEIGHT: f64 = 0.11;

    /// Channel value written for stain cells of a binary mask.
    pub const STAIN_VALUE: Channel = 0;
    /// Channel value written for background cells of a binary mask.
    pub const BACKGROUND_VALUE: Channel = 255;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Pixel {
        pub const STAIN: Pixel = Pixel::new(STAIN_VALUE, STAIN_VALUE, STAIN_VALUE, 255);
        pub const BACKGROUND: Pixel =
            Pixel::new(BACKGROUND_VALUE, BACKGROUND_VALUE, BACKGROUND_VALUE, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Perceived brightness as a weighted sum of R, G and B.
        pub fn luminance(&self) -> Luminance {
            RED_WEIGHT * self.red as f64
                + GREEN_WEIGHT * self.green as f64
                + BLUE_WEIGHT * self.blue as f64
        }

        /// Exact color match on R, G and B. Alpha is ignored.
        pub fn same_color(&self, other: &Pixel) -> bool {
            self.red == other.red && self.green == other.green && self.blue == other.blue
        }

        /// True for the (0,0,0) stain color of a binary mask.
        pub fn is_stain_black(&self) -> bool {
            self.same_color(&Pixel::STAIN)
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<&Rgba<Byte>> for Pixel {
        fn from(rgba: &Rgba<Byte>) -> Self {
            Pixel::from(rgba.0)
        }
    }
}
