//! Image normalization: rescale and recompress page rasters.
//!
//! Bounds the size of the final document: a 150-DPI US-letter render is
//! ~1275×1650 px, and embedding dozens of those at full size produces
//! multi-megabyte documents that chat transports reject. Shrinking each
//! raster to 70% linear scale and re-encoding at JPEG quality 75 keeps the
//! output manageable without making page text illegible.
//!
//! A malformed raster aborts the whole job rather than dropping the page:
//! a missing page would break the contiguous-sequence invariant and produce
//! a document that silently disagrees with its source.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::PageImage;
use image::imageops::FilterType;
use image::{GenericImageView, RgbImage};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Rescale and recompress one page raster in place.
///
/// Both axes shrink by `config.resize_ratio`, so aspect ratio is preserved
/// by construction. Returns the page with its post-rescale dimensions.
pub fn normalize_page(
    page: &PageImage,
    config: &ConversionConfig,
) -> Result<PageImage, ConvertError> {
    let img = image::open(&page.path).map_err(|e| ConvertError::ImageProcessing {
        page: page.index as usize,
        detail: e.to_string(),
    })?;

    let width = ((img.width() as f32 * config.resize_ratio).round() as u32).max(1);
    let height = ((img.height() as f32 * config.resize_ratio).round() as u32).max(1);
    let resized = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    write_jpeg(&page.path, &resized, config.jpeg_quality).map_err(|e| {
        ConvertError::ImageProcessing {
            page: page.index as usize,
            detail: format!("failed to re-encode: {e}"),
        }
    })?;

    debug!(
        "normalized page {}: {}x{} → {}x{}",
        page.index, page.width, page.height, width, height
    );

    Ok(PageImage {
        index: page.index,
        path: page.path.clone(),
        width,
        height,
    })
}

/// Encode an RGB image as JPEG at the given quality.
pub(crate) fn write_jpeg(path: &Path, image: &RgbImage, quality: u8) -> image::ImageResult<()> {
    let file = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
    image::codecs::jpeg::JpegEncoder::new_with_quality(BufWriter::new(file), quality)
        .encode_image(image)
}
