// THEORY:
// The `Binarizer` is the first stage of the estimation pipeline. It collapses an
// arbitrary-color image into a two-level mask: stain (black) or background (white).
// Every later stage reasons only about this mask, never about the source colors.
//
// The rule is deliberately simple: a pixel whose luminance is strictly greater than
// the threshold becomes background, anything else becomes stain. Alpha is forced to
// opaque so that transparent regions of the source cannot leak into the overlay.
// Because the output only ever contains pure black and pure white, binarizing a mask
// a second time returns it unchanged.

use crate::config::DEFAULT_THRESHOLD;
use crate::core_modules::pixel::pixel::{BACKGROUND_VALUE, Pixel, STAIN_VALUE};
use crate::core_modules::point_sampler::Point;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// A two-level stain/background mask with the same dimensions as its source image.
///
/// Read-only by construction: the only way to obtain one is through [`binarize`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    image: RgbaImage,
    stain_pixels: u64,
}

impl BinaryMask {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of cells classified as stain.
    pub fn stain_pixels(&self) -> u64 {
        self.stain_pixels
    }

    /// Whether the cell at `point` is stain. Points outside the mask are not.
    pub fn is_stain(&self, point: Point) -> bool {
        self.pixel(point).is_some_and(|pixel| pixel.is_stain_black())
    }

    pub fn pixel(&self, point: Point) -> Option<Pixel> {
        self.image
            .get_pixel_checked(point.x, point.y)
            .map(Pixel::from)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Binarizes `image` with the default luminance threshold.
pub fn binarize(image: &RgbaImage) -> BinaryMask {
    binarize_with_threshold(image, DEFAULT_THRESHOLD)
}

/// Binarizes `image`: luminance `> threshold` is background, everything else stain.
pub fn binarize_with_threshold(image: &RgbaImage, threshold: f64) -> BinaryMask {
    let mut stain_pixels = 0u64;
    let mask = RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let source = Pixel::from(image.get_pixel(x, y));
        let value = if source.luminance() > threshold {
            BACKGROUND_VALUE
        } else {
            stain_pixels += 1;
            STAIN_VALUE
        };
        Rgba([value, value, value, 255])
    });

    debug!(
        width = image.width(),
        height = image.height(),
        stain_pixels,
        threshold,
        "binarized image"
    );

    BinaryMask {
        image: mask,
        stain_pixels,
    }
}
