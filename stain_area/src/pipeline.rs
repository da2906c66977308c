// THEORY:
// The `pipeline` module is the top-level API of the estimation engine. It wires the
// sampler, the estimator and the result log into a single object so that a caller
// only hands over an image and a sample count and gets back a finished result.
//
// Flow for one call: sample → binarize/render/classify → append → return. The log
// is written last, so any failure along the way leaves it exactly as it was.

use crate::core_modules::area_estimator::AreaEstimator;
use crate::core_modules::point_sampler::PointSampler;
use crate::core_modules::result_log::ResultLog;
use crate::core_modules::utils::image_helper::image_helper::decode_image;
use crate::error::{StainError, StainResult};
use image::RgbaImage;
use rand::Rng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{info, warn};

// Re-export key data structures for the public API.
pub use crate::config::{ClassificationMode, EstimatorConfig, MarkerStyle};
pub use crate::core_modules::area_estimator::{EstimationResult, EstimationSummary};
pub use crate::core_modules::point_sampler::{Point, SamplePlan};
pub use crate::core_modules::result_log::Subscription;

/// The main, top-level struct for the estimation engine.
pub struct StainPipeline<R: Rng = StdRng> {
    config: EstimatorConfig,
    sampler: PointSampler<R>,
    estimator: AreaEstimator,
    log: ResultLog,
}

impl StainPipeline<StdRng> {
    /// Builds a pipeline whose sampler is seeded from `config.seed`, or from the OS
    /// when no seed is configured.
    pub fn new(config: EstimatorConfig) -> Self {
        let sampler = PointSampler::from_optional_seed(config.seed);
        Self::with_sampler(config, sampler)
    }
}

impl<R: Rng> StainPipeline<R> {
    /// Builds a pipeline around a caller-provided sampler.
    pub fn with_sampler(config: EstimatorConfig, sampler: PointSampler<R>) -> Self {
        Self {
            estimator: AreaEstimator::new(&config),
            sampler,
            log: ResultLog::new(),
            config,
        }
    }

    /// Runs one estimation with `sample_count` random points and records it.
    pub fn process(
        &mut self,
        image: &RgbaImage,
        sample_count: usize,
    ) -> StainResult<Arc<EstimationResult>> {
        if sample_count > self.config.max_sample_count {
            warn!(
                sample_count,
                max = self.config.max_sample_count,
                "sample count above configured maximum"
            );
            return Err(StainError::InvalidSampleCount {
                requested: sample_count,
                max: Some(self.config.max_sample_count),
            });
        }

        let points = self
            .sampler
            .sample(sample_count, image.width(), image.height())?;
        let result = self.estimator.estimate(&points, Some(image))?;
        let result = self.log.append(result);

        info!(
            run = self.log.len(),
            estimated_area = result.estimated_area,
            "estimation recorded"
        );
        Ok(result)
    }

    /// Runs one estimation with the configured default sample count.
    pub fn process_default(&mut self, image: &RgbaImage) -> StainResult<Arc<EstimationResult>> {
        self.process(image, self.config.default_sample_count)
    }

    /// Decodes raw image bytes (any common raster format) and runs one estimation.
    pub async fn process_bytes(
        &mut self,
        bytes: Vec<u8>,
        sample_count: usize,
    ) -> StainResult<Arc<EstimationResult>> {
        let image = decode_image(bytes).await?;
        self.process(&image, sample_count)
    }

    /// Every result recorded in this session, oldest first.
    pub fn results(&self) -> &[Arc<EstimationResult>] {
        self.log.all()
    }

    pub fn subscribe(&self) -> Subscription {
        self.log.subscribe()
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}
