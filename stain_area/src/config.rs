//! Estimator configuration
//!
//! Every tunable of the pipeline lives here with a documented default. Values can
//! be overridden from environment variables through [`EstimatorConfig::from_env`].

use std::env;

/// Luminance at or below which a pixel is considered stain.
pub const DEFAULT_THRESHOLD: f64 = 128.0;
/// Radius in pixels of the filled disc drawn at each sampled point.
pub const DEFAULT_MARKER_RADIUS: u32 = 4;
/// Width in pixels of the outline stroked around each disc.
pub const DEFAULT_MARKER_STROKE: u32 = 2;
/// Fully saturated, opaque red.
pub const DEFAULT_MARKER_COLOR: [u8; 4] = [255, 0, 0, 255];
pub const DEFAULT_MAX_SAMPLE_COUNT: usize = 1000;
pub const DEFAULT_SAMPLE_COUNT: usize = 100;
/// Largest radius or stroke width accepted from the environment. Keeps every
/// marker extent representable as an `i32` drawing coordinate.
pub const MAX_MARKER_EXTENT: u32 = (i32::MAX / 2) as u32;

/// How the estimator decides whether a sampled point landed on the stain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationMode {
    /// Read the binary mask directly at the point's coordinates.
    #[default]
    DirectLookup,
    /// Infer the answer from the rendered buffers: a point is inside when any pixel
    /// of its marker footprint is stain-black in the original mask and marker-colored
    /// in the marked copy. Overcounts near stain boundaries in proportion to the
    /// marker radius.
    RenderedOverlay,
}

impl ClassificationMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "direct" | "direct_lookup" | "lookup" => Some(Self::DirectLookup),
            "overlay" | "rendered" | "rendered_overlay" => Some(Self::RenderedOverlay),
            _ => None,
        }
    }
}

/// Appearance of the markers drawn on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub radius: u32,
    pub stroke_width: u32,
    pub color: [u8; 4],
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: DEFAULT_MARKER_RADIUS,
            stroke_width: DEFAULT_MARKER_STROKE,
            color: DEFAULT_MARKER_COLOR,
        }
    }
}

impl MarkerStyle {
    /// Distance from the marker center to the outer edge of its stroke.
    /// The stroke is centered on the disc edge, so half of it lies outside.
    pub fn outer_radius(&self) -> u32 {
        self.radius.saturating_add(self.stroke_width.div_ceil(2))
    }
}

fn parse_threshold(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_marker_extent(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|v| *v <= MAX_MARKER_EXTENT)
}

/// Configuration for the estimation pipeline.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Luminance threshold used by the binarizer (strict `>` is background).
    pub threshold: f64,
    pub marker: MarkerStyle,
    pub classification: ClassificationMode,
    /// Upper bound on the number of points a single estimation may request.
    pub max_sample_count: usize,
    /// Sample count used when the caller does not provide one.
    pub default_sample_count: usize,
    /// Fixed seed for the point sampler. `None` draws from the OS random source.
    pub seed: Option<u64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            marker: MarkerStyle::default(),
            classification: ClassificationMode::default(),
            max_sample_count: DEFAULT_MAX_SAMPLE_COUNT,
            default_sample_count: DEFAULT_SAMPLE_COUNT,
            seed: None,
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from environment variables, falling back to defaults.
    /// Unparseable or out-of-range values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("STAIN_THRESHOLD")
            && let Some(v) = parse_threshold(&val)
        {
            config.threshold = v;
        }
        if let Ok(val) = env::var("STAIN_MARKER_RADIUS")
            && let Some(v) = parse_marker_extent(&val)
        {
            config.marker.radius = v;
        }
        if let Ok(val) = env::var("STAIN_MARKER_STROKE")
            && let Some(v) = parse_marker_extent(&val)
        {
            config.marker.stroke_width = v;
        }
        if let Ok(val) = env::var("STAIN_MAX_SAMPLES")
            && let Ok(v) = val.parse()
        {
            config.max_sample_count = v;
        }
        if let Ok(val) = env::var("STAIN_DEFAULT_SAMPLES")
            && let Ok(v) = val.parse()
        {
            config.default_sample_count = v;
        }
        if let Ok(val) = env::var("STAIN_SEED")
            && let Ok(v) = val.parse()
        {
            config.seed = Some(v);
        }
        if let Ok(val) = env::var("STAIN_CLASSIFICATION")
            && let Some(mode) = ClassificationMode::parse(&val)
        {
            config.classification = mode;
        }

        config
    }

    /// Same configuration with a fixed sampler seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_classification(mut self, classification: ClassificationMode) -> Self {
        self.classification = classification;
        self
    }
}
