// THEORY:
// This file is the main entry point for the `stain_area` library crate.
//
// The crate estimates the area of a stained region in a raster image by Monte Carlo
// sampling: random points are thrown at a binarized copy of the image and the
// fraction that lands on the stain is scaled to the image's pixel area. Each run
// also produces an overlay image showing where the points fell.
//
// The `StainPipeline` in `pipeline` is the high-level interface. The individual
// stages (`binarizer`, `point_sampler`, `overlay_renderer`, `area_estimator`,
// `result_log`) live in `core_modules` and can be used on their own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::{StainError, StainResult};
pub use pipeline::StainPipeline;
