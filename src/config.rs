//! Configuration for a PDF-to-DOCX conversion job.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share a config across jobs and to see in one place which
//! policies a given front-end runs with.
//!
//! The credential/config split matters here: nothing in this struct is read
//! from process-global state. Front-ends construct a config explicitly at
//! startup and pass it into every job.

use crate::error::ConvertError;
use crate::pipeline::raster::Rasterizer;
use crate::progress::JobProgress;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one conversion job (shareable across jobs).
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2docx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .resize_ratio(0.7)
///     .jpeg_quality(75)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rasterization scale factor over the 72-DPI PDF baseline. Default: 2.0.
    ///
    /// 2.0 renders at ~150 DPI — sharp enough that rescaled page images stay
    /// readable in the output document, while keeping raster files small
    /// enough that a long document does not balloon the working directory.
    pub raster_scale: f32,

    /// Linear rescale ratio applied to each page raster. Default: 0.70.
    ///
    /// Both axes shrink by the same ratio, so aspect ratio is preserved by
    /// construction. Values above 1.0 would upscale and are rejected by the
    /// builder.
    pub resize_ratio: f32,

    /// JPEG quality for normalized page images, 1–100. Default: 75.
    pub jpeg_quality: u8,

    /// Maximum embedded image width in the output document, in inches.
    /// Default: 5.5 — fits a US-letter page with standard margins.
    pub max_image_width_inches: f32,

    /// Filename prefix for per-page raster files in the working directory.
    /// Default: `"page_"`. Pages are written as `page_1.jpg … page_N.jpg`;
    /// the numeric suffix matches source page order.
    pub page_file_prefix: String,

    /// Target namespace for the output document filename. Default: `"."`.
    ///
    /// The Naming Service reserves a collision-free `.docx` name here; the
    /// assembled document lives at that path until delivery, then cleanup
    /// removes it.
    pub output_dir: PathBuf,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Rasterization backend. `None` selects the built-in pdfium backend.
    ///
    /// Any [`Rasterizer`] implementation satisfies the pipeline; tests and
    /// embedders can inject their own.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Advisory progress callback receiving job state transitions.
    pub progress: Option<Arc<dyn JobProgress>>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            raster_scale: 2.0,
            resize_ratio: 0.70,
            jpeg_quality: 75,
            max_image_width_inches: 5.5,
            page_file_prefix: "page_".to_string(),
            output_dir: PathBuf::from("."),
            password: None,
            rasterizer: None,
            progress: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("raster_scale", &self.raster_scale)
            .field("resize_ratio", &self.resize_ratio)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("max_image_width_inches", &self.max_image_width_inches)
            .field("page_file_prefix", &self.page_file_prefix)
            .field("output_dir", &self.output_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"))
            .field("progress", &self.progress.as_ref().map(|_| "<dyn JobProgress>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn raster_scale(mut self, scale: f32) -> Self {
        self.config.raster_scale = scale.clamp(0.5, 8.0);
        self
    }

    pub fn resize_ratio(mut self, ratio: f32) -> Self {
        self.config.resize_ratio = ratio;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn max_image_width_inches(mut self, inches: f32) -> Self {
        self.config.max_image_width_inches = inches;
        self
    }

    pub fn page_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.page_file_prefix = prefix.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn JobProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(c.resize_ratio > 0.0 && c.resize_ratio <= 1.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "resize_ratio must be in (0, 1], got {}",
                c.resize_ratio
            )));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(ConvertError::InvalidConfig(format!(
                "jpeg_quality must be 1-100, got {}",
                c.jpeg_quality
            )));
        }
        if !(c.max_image_width_inches > 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "max_image_width_inches must be positive, got {}",
                c.max_image_width_inches
            )));
        }
        if c.page_file_prefix.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "page_file_prefix must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = ConversionConfig::builder().build().expect("valid config");
        assert_eq!(config.raster_scale, 2.0);
        assert_eq!(config.resize_ratio, 0.70);
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.max_image_width_inches, 5.5);
        assert_eq!(config.page_file_prefix, "page_");
    }

    #[test]
    fn raster_scale_is_clamped() {
        let config = ConversionConfig::builder()
            .raster_scale(100.0)
            .build()
            .expect("valid config");
        assert_eq!(config.raster_scale, 8.0);
    }

    #[test]
    fn out_of_range_resize_ratio_is_rejected() {
        assert!(ConversionConfig::builder().resize_ratio(0.0).build().is_err());
        assert!(ConversionConfig::builder().resize_ratio(1.5).build().is_err());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        assert!(ConversionConfig::builder().jpeg_quality(0).build().is_err());
        assert!(ConversionConfig::builder().jpeg_quality(101).build().is_err());
    }

    #[test]
    fn debug_redacts_password_and_trait_objects() {
        let config = ConversionConfig::builder()
            .password("secret")
            .build()
            .expect("valid config");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("secret"), "got: {dbg}");
        assert!(dbg.contains("redacted"), "got: {dbg}");
    }
}
