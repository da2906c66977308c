// THEORY:
// The `AreaEstimator` is the analytical core of the engine. Given a sample plan and
// a source image it answers one question: what fraction of the darts landed on the
// stain, and how much area does that fraction represent?
//
// Stages, in order:
// 1.  **Validation**: an estimate needs an image with a non-empty surface and at
//     least three in-bounds points. Anything less is rejected before any work is done.
// 2.  **Binarization**: the image is reduced to a stain/background mask.
// 3.  **Rendering**: the overlay renderer produces the unmarked and marked buffers
//     that travel with the result for display.
// 4.  **Classification**: each point is labelled inside or outside. By default the
//     mask is read directly at the point's coordinates. The alternative mode infers
//     the label from the rendered buffers and overcounts near stain boundaries.
// 5.  **Scaling**: the inside ratio is multiplied by the bounding area (width x
//     height) and rounded to four decimal places.
//
// The result is only built once every stage has succeeded, so a failed estimate
// never produces a partial result.

use crate::config::{ClassificationMode, EstimatorConfig};
use crate::core_modules::binarizer::{BinaryMask, binarize_with_threshold};
use crate::core_modules::overlay_renderer::{OverlayBuffers, OverlayRenderer};
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::point_sampler::{Point, SamplePlan};
use crate::error::{StainError, StainResult};
use image::RgbaImage;
use tracing::{debug, info};

/// Fewer points than this make the inside ratio meaningless.
pub const MIN_POINTS: usize = 3;

const AREA_DECIMALS: i32 = 4;

/// The complete, immutable record of one estimation.
#[derive(Debug, Clone)]
pub struct EstimationResult {
    /// The sampled coordinates, in generation order.
    pub points: SamplePlan,
    pub points_inside: usize,
    pub total_points: usize,
    /// Bounding area of the image (width x height).
    pub total_area: u64,
    /// `total_area * points_inside / total_points`, rounded to four decimals.
    pub estimated_area: f64,
    /// The binarized image without markers.
    pub original_image: RgbaImage,
    /// The binarized image with a marker at every sampled point.
    pub modified_image: RgbaImage,
}

/// Pixel-free view of an [`EstimationResult`] for display and audit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EstimationSummary {
    pub width: u32,
    pub height: u32,
    pub points: SamplePlan,
    pub points_inside: usize,
    pub total_points: usize,
    pub total_area: u64,
    pub estimated_area: f64,
}

impl EstimationResult {
    pub fn width(&self) -> u32 {
        self.original_image.width()
    }

    pub fn height(&self) -> u32 {
        self.original_image.height()
    }

    /// Fraction of the sampled points that landed on the stain.
    pub fn inside_ratio(&self) -> f64 {
        self.points_inside as f64 / self.total_points as f64
    }

    /// The estimated area with its reporting precision, e.g. `"100.0000"`.
    pub fn formatted_area(&self) -> String {
        format!("{:.*}", AREA_DECIMALS as usize, self.estimated_area)
    }

    pub fn summary(&self) -> EstimationSummary {
        EstimationSummary {
            width: self.width(),
            height: self.height(),
            points: self.points.clone(),
            points_inside: self.points_inside,
            total_points: self.total_points,
            total_area: self.total_area,
            estimated_area: self.estimated_area,
        }
    }
}

/// Classifies sampled points against a stain mask and scales the result to an area.
#[derive(Debug, Clone)]
pub struct AreaEstimator {
    threshold: f64,
    classification: ClassificationMode,
    renderer: OverlayRenderer,
}

impl Default for AreaEstimator {
    fn default() -> Self {
        Self::new(&EstimatorConfig::default())
    }
}

impl AreaEstimator {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            threshold: config.threshold,
            classification: config.classification,
            renderer: OverlayRenderer::new(config.marker),
        }
    }

    pub fn estimate(
        &self,
        points: &[Point],
        image: Option<&RgbaImage>,
    ) -> StainResult<EstimationResult> {
        let image = Self::validate(points, image)?;
        let (width, height) = image.dimensions();

        let mask = binarize_with_threshold(image, self.threshold);
        let overlay = self.renderer.render(&mask, points)?;

        let points_inside = match self.classification {
            ClassificationMode::DirectLookup => Self::count_direct(&mask, points),
            ClassificationMode::RenderedOverlay => self.count_rendered(&overlay, points),
        };
        let total_points = points.len();
        let total_area = width as u64 * height as u64;
        let estimated_area = scale_to_area(total_area, points_inside, total_points);

        info!(
            width,
            height,
            points_inside,
            total_points,
            estimated_area,
            mode = ?self.classification,
            "estimated stain area"
        );

        Ok(EstimationResult {
            points: points.to_vec(),
            points_inside,
            total_points,
            total_area,
            estimated_area,
            original_image: overlay.original,
            modified_image: overlay.marked,
        })
    }

    fn validate<'a>(points: &[Point], image: Option<&'a RgbaImage>) -> StainResult<&'a RgbaImage> {
        let image = image.ok_or_else(|| StainError::Validation("no image supplied".into()))?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(StainError::Validation(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if points.len() < MIN_POINTS {
            return Err(StainError::Validation(format!(
                "at least {MIN_POINTS} points are required, got {}",
                points.len()
            )));
        }
        if let Some(outside) = points.iter().find(|p| !p.is_within(width, height)) {
            return Err(StainError::Validation(format!(
                "point ({}, {}) lies outside the {width}x{height} image",
                outside.x, outside.y
            )));
        }
        Ok(image)
    }

    fn count_direct(mask: &BinaryMask, points: &[Point]) -> usize {
        points.iter().filter(|point| mask.is_stain(**point)).count()
    }

    /// A point counts as inside when any pixel of its marker footprint is stain in
    /// the original buffer and marker-colored in the marked one.
    fn count_rendered(&self, overlay: &OverlayBuffers, points: &[Point]) -> usize {
        let (width, height) = overlay.original.dimensions();
        let marker = self.renderer.marker_pixel();

        let inside = points
            .iter()
            .filter(|point| {
                self.renderer
                    .footprint(**point, width, height)
                    .any(|cell| {
                        let original = Pixel::from(overlay.original.get_pixel(cell.x, cell.y));
                        let marked = Pixel::from(overlay.marked.get_pixel(cell.x, cell.y));
                        original.is_stain_black() && marked.same_color(&marker)
                    })
            })
            .count();

        debug!(inside, total = points.len(), "classified points from rendered overlay");
        inside
    }
}

/// `total_area * inside / total`, rounded to four decimal places.
pub fn scale_to_area(total_area: u64, inside: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = total_area as f64 * inside as f64 / total as f64;
    let factor = 10f64.powi(AREA_DECIMALS);
    (raw * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerStyle;
    use crate::core_modules::point_sampler::PointSampler;
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn half_split(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| if x < width / 2 { BLACK } else { WHITE })
    }

    fn overlay_estimator() -> AreaEstimator {
        AreaEstimator::new(
            &EstimatorConfig::default().with_classification(ClassificationMode::RenderedOverlay),
        )
    }

    #[test]
    fn all_black_ten_by_ten_with_ten_points() {
        let image = RgbaImage::from_pixel(10, 10, BLACK);
        let points = PointSampler::from_seed(5).sample(10, 10, 10).unwrap();

        let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();

        assert_eq!(result.points_inside, 10);
        assert_eq!(result.total_points, 10);
        assert_eq!(result.total_area, 100);
        assert_eq!(result.estimated_area, 100.0);
        assert_eq!(result.formatted_area(), "100.0000");
        assert_eq!(result.points, points);
    }

    #[test]
    fn fully_stained_image_in_both_modes() {
        let image = RgbaImage::from_pixel(25, 17, Rgba([60, 20, 90, 255]));
        let points = PointSampler::from_seed(11).sample(200, 25, 17).unwrap();

        for estimator in [AreaEstimator::default(), overlay_estimator()] {
            let result = estimator.estimate(&points, Some(&image)).unwrap();
            assert_eq!(result.points_inside, result.total_points);
            assert_eq!(result.estimated_area, result.total_area as f64);
        }
    }

    #[test]
    fn fully_background_image_in_both_modes() {
        let image = RgbaImage::from_pixel(25, 17, Rgba([220, 210, 200, 255]));
        let points = PointSampler::from_seed(12).sample(200, 25, 17).unwrap();

        for estimator in [AreaEstimator::default(), overlay_estimator()] {
            let result = estimator.estimate(&points, Some(&image)).unwrap();
            assert_eq!(result.points_inside, 0);
            assert_eq!(result.estimated_area, 0.0);
        }
    }

    #[test]
    fn half_split_converges_to_half_the_area() {
        let image = half_split(100, 60);
        let points = PointSampler::from_seed(2024).sample(20_000, 100, 60).unwrap();

        let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();

        let expected = result.total_area as f64 / 2.0;
        let relative_error = (result.estimated_area - expected).abs() / expected;
        assert!(relative_error < 0.05, "estimate {} vs {}", result.estimated_area, expected);
    }

    #[test]
    fn two_thousand_points_land_within_five_percent() {
        let image = half_split(100, 60);
        let expected = 3000.0;
        let estimates: Vec<f64> = (1..=8)
            .map(|seed| {
                let points = PointSampler::from_seed(seed).sample(2000, 100, 60).unwrap();
                let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();
                result.estimated_area
            })
            .collect();

        let close = estimates
            .iter()
            .filter(|area| (*area - expected).abs() / expected < 0.05)
            .count();
        assert!(close >= 6, "only {close} of 8 estimates within 5%: {estimates:?}");

        let mean = estimates.iter().sum::<f64>() / estimates.len() as f64;
        assert!((mean - expected).abs() / expected < 0.05, "mean estimate {mean}");
    }

    #[test]
    fn oversized_marker_still_estimates() {
        let config = EstimatorConfig {
            marker: MarkerStyle {
                radius: u32::MAX,
                ..MarkerStyle::default()
            },
            ..EstimatorConfig::default()
        };
        let image = RgbaImage::from_pixel(10, 10, BLACK);
        let points = [Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)];

        for mode in [ClassificationMode::DirectLookup, ClassificationMode::RenderedOverlay] {
            let estimator = AreaEstimator::new(&config.clone().with_classification(mode));
            let result = estimator.estimate(&points, Some(&image)).unwrap();
            assert_eq!(result.points_inside, 3);
            assert_eq!(result.estimated_area, 100.0);
            assert!(result.modified_image.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
        }
    }

    #[test]
    fn rendered_overlay_never_undercounts_direct_lookup() {
        let image = half_split(80, 80);
        let points = PointSampler::from_seed(77).sample(500, 80, 80).unwrap();

        let direct = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();
        let rendered = overlay_estimator().estimate(&points, Some(&image)).unwrap();

        assert!(rendered.points_inside >= direct.points_inside);
        assert!(rendered.points_inside <= rendered.total_points);
    }

    #[test]
    fn rendered_overlay_counts_markers_touching_the_stain() {
        // Stain is the single column x = 0; a point at x = 3 is outside but its
        // marker reaches the column.
        let image = RgbaImage::from_fn(20, 20, |x, _| if x == 0 { BLACK } else { WHITE });
        let points = [Point::new(3, 10), Point::new(15, 10), Point::new(19, 19)];

        let direct = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();
        let rendered = overlay_estimator().estimate(&points, Some(&image)).unwrap();

        assert_eq!(direct.points_inside, 0);
        assert_eq!(rendered.points_inside, 1);
    }

    #[test]
    fn duplicate_points_are_counted_each_time() {
        let image = half_split(10, 10);
        let points = [Point::new(1, 1), Point::new(1, 1), Point::new(8, 8)];
        let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();
        assert_eq!(result.points_inside, 2);
        assert_eq!(result.estimated_area, 66.6667);
    }

    #[test]
    fn bounds_invariants_hold() {
        let image = RgbaImage::from_fn(31, 23, |x, y| {
            if (x * y) % 7 < 3 { BLACK } else { WHITE }
        });
        let mut sampler = PointSampler::from_seed(99);
        for n in [3, 17, 250] {
            let points = sampler.sample(n, 31, 23).unwrap();
            for estimator in [AreaEstimator::default(), overlay_estimator()] {
                let result = estimator.estimate(&points, Some(&image)).unwrap();
                assert!(result.points_inside <= result.total_points);
                assert_eq!(result.total_points, result.points.len());
                assert!(result.estimated_area >= 0.0);
                assert!(result.estimated_area <= result.total_area as f64);
            }
        }
    }

    #[test]
    fn corner_points_do_not_fail() {
        let image = RgbaImage::from_pixel(12, 9, BLACK);
        let points = [Point::new(0, 0), Point::new(11, 8), Point::new(0, 8)];
        for estimator in [AreaEstimator::default(), overlay_estimator()] {
            let result = estimator.estimate(&points, Some(&image)).unwrap();
            assert_eq!(result.points_inside, 3);
        }
    }

    #[test]
    fn two_points_are_rejected() {
        let image = RgbaImage::from_pixel(10, 10, BLACK);
        let err = AreaEstimator::default()
            .estimate(&[Point::new(1, 1), Point::new(2, 2)], Some(&image))
            .unwrap_err();
        assert!(matches!(err, StainError::Validation(_)));
    }

    #[test]
    fn missing_image_is_rejected() {
        let points = [Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)];
        let err = AreaEstimator::default().estimate(&points, None).unwrap_err();
        assert!(matches!(err, StainError::Validation(_)));
    }

    #[test]
    fn empty_image_is_rejected() {
        let points = [Point::new(0, 0), Point::new(0, 0), Point::new(0, 0)];
        let err = AreaEstimator::default()
            .estimate(&points, Some(&RgbaImage::new(0, 4)))
            .unwrap_err();
        assert!(matches!(err, StainError::Validation(_)));
    }

    #[test]
    fn out_of_bounds_point_is_rejected() {
        let image = RgbaImage::from_pixel(10, 10, BLACK);
        let points = [Point::new(1, 1), Point::new(10, 2), Point::new(3, 3)];
        let err = AreaEstimator::default().estimate(&points, Some(&image)).unwrap_err();
        assert!(matches!(err, StainError::Validation(_)));
    }

    #[test]
    fn result_carries_both_rendered_images() {
        let image = RgbaImage::from_pixel(30, 30, WHITE);
        let points = [Point::new(5, 5), Point::new(15, 15), Point::new(25, 25)];
        let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();

        assert_eq!(result.width(), 30);
        assert_eq!(result.height(), 30);
        assert_eq!(*result.original_image.get_pixel(15, 15), WHITE);
        assert_eq!(*result.modified_image.get_pixel(15, 15), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(15, 15), WHITE);
    }

    #[test]
    fn summary_mirrors_the_result() {
        let image = half_split(10, 4);
        let points = [Point::new(0, 0), Point::new(9, 0), Point::new(9, 3), Point::new(2, 1)];
        let result = AreaEstimator::default().estimate(&points, Some(&image)).unwrap();
        let summary = result.summary();

        assert_eq!(summary.width, 10);
        assert_eq!(summary.height, 4);
        assert_eq!(summary.points_inside, 2);
        assert_eq!(summary.estimated_area, 20.0);
        assert_eq!(result.inside_ratio(), 0.5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn summary_serializes_to_json() {
        let image = half_split(10, 4);
        let points = [Point::new(0, 0), Point::new(9, 0), Point::new(9, 3), Point::new(2, 1)];
        let summary = AreaEstimator::default()
            .estimate(&points, Some(&image))
            .unwrap()
            .summary();

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["width"], 10);
        assert_eq!(json["points_inside"], 2);
        assert_eq!(json["estimated_area"], 20.0);
        assert_eq!(json["points"][1], serde_json::json!({ "x": 9, "y": 0 }));
    }

    #[test]
    fn area_is_rounded_to_four_decimals() {
        assert_eq!(scale_to_area(100, 1, 3), 33.3333);
        assert_eq!(scale_to_area(7, 2, 3), 4.6667);
        assert_eq!(scale_to_area(50, 0, 9), 0.0);
        assert_eq!(scale_to_area(50, 9, 9), 50.0);
    }
}
