// THEORY:
// The `OverlayRenderer` turns a binary mask and a sample plan into the visual proof
// of an estimation: a copy of the mask with a marker drawn at every sampled point.
//
// Key principles:
// 1.  **Private Surface**: Rendering always happens on a fresh copy of the mask. The
//     mask itself (and therefore the caller's image) is never touched, and the
//     untouched copy is handed back next to the marked one.
// 2.  **Fixed Marker Shape**: Each marker is a filled disc plus a stroked outline in a
//     single color, so a marker looks like one solid dot of `outer_radius`.
// 3.  **Natural Clipping**: Markers near the border are drawn partially; anything
//     that falls off the canvas is simply not painted.

use crate::config::MarkerStyle;
use crate::core_modules::binarizer::BinaryMask;
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::point_sampler::Point;
use crate::error::{StainError, StainResult};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};
use tracing::debug;

/// The unmarked and marked pixel grids produced for one estimation.
#[derive(Debug, Clone)]
pub struct OverlayBuffers {
    /// The binarized image, exactly as the binarizer produced it.
    pub original: RgbaImage,
    /// The binarized image with a marker drawn at every sampled point.
    pub marked: RgbaImage,
}

/// Draws sampled points onto a copy of a binary mask.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    marker: MarkerStyle,
}

impl OverlayRenderer {
    pub fn new(marker: MarkerStyle) -> Self {
        Self { marker }
    }

    pub fn render(&self, mask: &BinaryMask, points: &[Point]) -> StainResult<OverlayBuffers> {
        let original = mask.as_image().clone();
        let mut marked = Self::allocate_surface(&original)?;
        let color = Rgba(self.marker.color);

        // A disc wider than width + height already covers the whole canvas, and any
        // ring beyond that lies entirely off it.
        let limit = original.width().saturating_add(original.height());
        let radius = to_coordinate(self.marker.radius.min(limit), "marker radius")?;
        let outer = to_coordinate(self.marker.outer_radius().min(limit), "marker outline")?;

        for point in points {
            let center = (
                to_coordinate(point.x, "point x")?,
                to_coordinate(point.y, "point y")?,
            );
            draw_filled_circle_mut(&mut marked, center, radius, color);
            for ring in radius..=outer {
                draw_hollow_circle_mut(&mut marked, center, ring, color);
            }
        }

        debug!(
            points = points.len(),
            radius = self.marker.radius,
            stroke = self.marker.stroke_width,
            "rendered overlay"
        );

        Ok(OverlayBuffers { original, marked })
    }

    /// Every in-bounds coordinate a marker centered at `point` can cover.
    pub fn footprint(&self, point: Point, width: u32, height: u32) -> impl Iterator<Item = Point> {
        let reach = self.marker.outer_radius();
        let reach_squared = u64::from(reach).pow(2);
        let min_x = point.x.saturating_sub(reach);
        let min_y = point.y.saturating_sub(reach);
        let max_x = point.x.saturating_add(reach).min(width.saturating_sub(1));
        let max_y = point.y.saturating_add(reach).min(height.saturating_sub(1));
        let rows = (width > 0 && height > 0)
            .then_some(min_y..=max_y)
            .into_iter()
            .flatten();

        rows.flat_map(move |y| (min_x..=max_x).map(move |x| Point::new(x, y)))
            .filter(move |candidate| {
                let dx = u64::from(candidate.x.abs_diff(point.x));
                let dy = u64::from(candidate.y.abs_diff(point.y));
                dx.pow(2).saturating_add(dy.pow(2)) <= reach_squared
            })
    }

    /// The marker color as a pixel, for exact color comparisons.
    pub fn marker_pixel(&self) -> Pixel {
        Pixel::from(self.marker.color)
    }

    fn allocate_surface(source: &RgbaImage) -> StainResult<RgbaImage> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(StainError::RenderSurfaceUnavailable(format!(
                "cannot allocate a {width}x{height} canvas"
            )));
        }
        RgbaImage::from_raw(width, height, source.as_raw().clone()).ok_or_else(|| {
            StainError::RenderSurfaceUnavailable(format!(
                "pixel buffer does not fit a {width}x{height} canvas"
            ))
        })
    }
}

fn to_coordinate(value: u32, what: &str) -> StainResult<i32> {
    i32::try_from(value).map_err(|_| {
        StainError::RenderSurfaceUnavailable(format!("{what} {value} exceeds the drawing range"))
    })
}
