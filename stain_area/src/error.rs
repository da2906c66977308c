//! Error definitions shared by every stage of the estimation pipeline.

use thiserror::Error;

/// Errors that can occur while sampling, rendering or estimating.
///
/// None of these are transient. They are surfaced to the caller as-is and the
/// result log is never touched when one is returned.
#[derive(Debug, Error)]
pub enum StainError {
    /// The input cannot produce a meaningful estimate (missing image, too few
    /// points, a point outside the image bounds...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Sampling was asked for zero points, or for more than the configured maximum.
    /// `max` is `None` when only the lower bound was violated.
    #[error("Invalid sample count: {requested}{}", describe_max(.max))]
    InvalidSampleCount { requested: usize, max: Option<usize> },

    /// The environment could not provide a canvas to composite the overlay on.
    #[error("Render surface unavailable: {0}")]
    RenderSurfaceUnavailable(String),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image decoding task failed: {0}")]
    DecodeTask(String),
}

fn describe_max(max: &Option<usize>) -> String {
    max.map(|m| format!(" (maximum {m})")).unwrap_or_default()
}

pub type StainResult<T> = Result<T, StainError>;
