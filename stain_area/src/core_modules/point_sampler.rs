// THEORY:
// The `PointSampler` produces the Monte Carlo "darts": integer coordinates drawn
// independently and uniformly over the image bounds. It knows nothing about the
// stain; it only needs a width, a height and a source of randomness.
//
// The random source is a type parameter so that tests (and anyone who needs an
// auditable run) can inject a seeded generator, while production code draws its
// seed from the operating system. Points are returned in generation order and are
// never deduplicated.

use crate::error::{StainError, StainResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// A pixel coordinate inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

/// The ordered list of points drawn for one estimation.
pub type SamplePlan = Vec<Point>;

/// Draws uniformly distributed points from a pluggable random source.
pub struct PointSampler<R: Rng = StdRng> {
    rng: R,
}

impl PointSampler<StdRng> {
    /// A deterministic sampler: the same seed always yields the same plans.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A sampler seeded from the operating system's random source.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Seeded when `seed` is provided, OS-seeded otherwise.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_os_rng(),
        }
    }
}

impl<R: Rng> PointSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draws `n` points uniformly over `[0, width) x [0, height)`.
    pub fn sample(&mut self, n: usize, width: u32, height: u32) -> StainResult<SamplePlan> {
        if n < 1 {
            return Err(StainError::InvalidSampleCount {
                requested: n,
                max: None,
            });
        }
        if width == 0 || height == 0 {
            return Err(StainError::Validation(format!(
                "cannot sample inside empty bounds {width}x{height}"
            )));
        }

        let plan: SamplePlan = (0..n)
            .map(|_| {
                Point::new(
                    self.rng.random_range(0..width),
                    self.rng.random_range(0..height),
                )
            })
            .collect();

        debug!(n, width, height, "sampled points");
        Ok(plan)
    }
}
