//! PDF rasterization: render every page to a raster file via pdfium.
//!
//! ## One contract, any backend
//!
//! [`Rasterizer`] is the single capability the pipeline needs: "render PDF →
//! ordered raster sequence". The built-in [`PdfiumRasterizer`] is the default
//! backend; tests and embedders can supply any other implementation through
//! [`crate::config::ConversionConfigBuilder::rasterizer`].
//!
//! ## Why the orchestrator wraps this in spawn_blocking
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread-pool
//! thread, preventing the Tokio worker threads from stalling during CPU-heavy
//! rendering. The trait itself is synchronous for the same reason.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::PageImage;
use crate::pipeline::normalize::write_jpeg;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// JPEG quality for the intermediate per-page rasters. Near-lossless; the
/// normalizer recompresses at the configured output quality afterwards.
const RASTER_JPEG_QUALITY: u8 = 90;

/// Render a PDF into an ordered sequence of page raster files.
///
/// Implementations must:
/// - produce exactly one [`PageImage`] per source page, indices contiguous
///   from 1 in source page order;
/// - write each raster into `out_dir` as
///   `<page_file_prefix><index>.jpg`, so the numeric suffix agrees with the
///   sequence index;
/// - fail with a `SourceUnreadable`-class error when the document cannot be
///   parsed or decrypted.
///
/// A structurally valid document with zero pages yields an empty vector;
/// the assembler rejects empty sequences downstream.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        pdf: &Path,
        out_dir: &Path,
        config: &ConversionConfig,
    ) -> Result<Vec<PageImage>, ConvertError>;
}

/// The default pdfium-backed rasterization backend.
///
/// Binds to a pdfium library found next to the executable or installed on
/// the system (`PDFIUM_LIB_PATH`-style setups work through
/// `bind_to_system_library`).
#[derive(Debug, Default)]
pub struct PdfiumRasterizer;

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf: &Path,
        out_dir: &Path,
        config: &ConversionConfig,
    ) -> Result<Vec<PageImage>, ConvertError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| ConvertError::BackendUnavailable(format!("{e:?}")))?;
        let pdfium = Pdfium::new(bindings);

        let password = config.password.as_deref();
        let document = pdfium
            .load_pdf_from_file(pdf, password)
            .map_err(|e| classify_load_error(pdf, password, e))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded: {} pages", total);

        // 2x over the 72-DPI baseline ≈ 150 DPI.
        let render_config = PdfRenderConfig::new().scale_page_by_factor(config.raster_scale);

        let mut results = Vec::with_capacity(total);
        for (i, page) in pages.iter().enumerate() {
            let index = (i + 1) as u32;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ConvertError::RasterizationFailed {
                    page: index as usize,
                    detail: format!("{e:?}"),
                }
            })?;

            let image = bitmap.as_image().to_rgb8();
            let (width, height) = image.dimensions();
            let path = out_dir.join(format!("{}{}.jpg", config.page_file_prefix, index));
            write_jpeg(&path, &image, RASTER_JPEG_QUALITY).map_err(|e| {
                ConvertError::RasterizationFailed {
                    page: index as usize,
                    detail: format!("failed to write raster: {e}"),
                }
            })?;

            debug!("rendered page {} → {}x{} px at {}", index, width, height, path.display());
            results.push(PageImage {
                index,
                path,
                width,
                height,
            });
        }

        Ok(results)
    }
}

/// Map a pdfium load failure onto the source-error taxonomy.
fn classify_load_error(
    pdf: &Path,
    password: Option<&str>,
    e: PdfiumError,
) -> ConvertError {
    let err_str = format!("{e:?}");
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ConvertError::WrongPassword {
                path: pdf.to_path_buf(),
            }
        } else {
            ConvertError::PasswordRequired {
                path: pdf.to_path_buf(),
            }
        }
    } else {
        ConvertError::SourceUnreadable {
            path: pdf.to_path_buf(),
            detail: err_str,
        }
    }
}
