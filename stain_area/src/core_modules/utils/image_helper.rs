// Decoding of uploaded bytes into pixel buffers, and PNG encoding of result buffers
// for display. Decoding is the only asynchronous step of the pipeline; it runs on
// the blocking pool so the estimation itself never waits on I/O.

pub mod image_helper {
    use crate::error::{StainError, StainResult};
    use image::{ImageEncoder, RgbaImage};
    use std::path::Path;
    use tracing::debug;

    /// Decodes any raster format the `image` crate recognizes into RGBA8.
    pub fn decode_image_blocking(bytes: &[u8]) -> StainResult<RgbaImage> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        debug!(
            bytes = bytes.len(),
            width = decoded.width(),
            height = decoded.height(),
            "decoded image"
        );
        Ok(decoded)
    }

    pub async fn decode_image(bytes: Vec<u8>) -> StainResult<RgbaImage> {
        tokio::task::spawn_blocking(move || decode_image_blocking(&bytes))
            .await
            .map_err(|e| StainError::DecodeTask(e.to_string()))?
    }

    pub fn encode_png(image: &RgbaImage) -> StainResult<Vec<u8>> {
        let mut output = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(output)
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbaImage) -> StainResult<()> {
        let output = std::fs::File::create(path.as_ref()).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        debug!(path = %path.as_ref().display(), "saved png");
        Ok(())
    }
}
