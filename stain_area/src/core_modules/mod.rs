pub mod area_estimator;
pub mod binarizer;
pub mod overlay_renderer;
pub mod pixel;
pub mod point_sampler;
pub mod result_log;
pub mod utils;
