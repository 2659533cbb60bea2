//! Document assembly: embed page images into a paginated `.docx`.
//!
//! Each image occupies its own page, scaled to a fixed maximum width with
//! preserved aspect ratio, followed by an explicit page break after every
//! image except the last. The produced document reflects exactly the
//! sequence order it is given: [`assemble`] takes the typed, validated
//! [`PageImage`] sequence; [`assemble_from_dir`] is the fallback
//! compatibility mode that recovers page order from naturally-ordered
//! directory enumeration.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::naming;
use crate::output::PageImage;
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use image::GenericImageView;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// English Metric Units per inch, the unit OOXML uses for image extents.
const EMU_PER_INCH: u64 = 914_400;

/// Assemble the output document from a typed page sequence.
///
/// The sequence must be contiguous, 1-based, and strictly increasing —
/// exactly what the rasterizer produces and the normalizer preserves. Any
/// gap, duplicate, or reordering is a pipeline bug upstream and is rejected
/// here rather than silently producing a document that disagrees with its
/// source.
pub fn assemble(
    pages: &[PageImage],
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<(), ConvertError> {
    for (i, page) in pages.iter().enumerate() {
        let expected = (i + 1) as u32;
        if page.index != expected {
            return Err(ConvertError::Assembly {
                detail: format!(
                    "page sequence broken at position {}: expected index {}, got {}",
                    i + 1,
                    expected,
                    page.index
                ),
            });
        }
    }

    let paths: Vec<PathBuf> = pages.iter().map(|p| p.path.clone()).collect();
    embed(&paths, output_path, config)?;
    Ok(())
}

/// Fallback compatibility mode: assemble from a directory listing.
///
/// Enumerates `.jpg`/`.jpeg` files in natural order (numeric suffixes sort
/// numerically), so `page_2.jpg` is embedded before `page_10.jpg`. Returns
/// the number of embedded pages.
pub fn assemble_from_dir(
    dir: &Path,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<usize, ConvertError> {
    let paths = naming::list_page_images(dir).map_err(|e| ConvertError::Assembly {
        detail: format!("failed to enumerate '{}': {e}", dir.display()),
    })?;
    embed(&paths, output_path, config)
}

/// Embed `paths` in order, one image per page, into `output_path`.
fn embed(
    paths: &[PathBuf],
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<usize, ConvertError> {
    if paths.is_empty() {
        return Err(ConvertError::Assembly {
            detail: "no page images to embed (zero-page source)".into(),
        });
    }

    let width_emu = (config.max_image_width_inches as f64 * EMU_PER_INCH as f64) as u64;
    let mut docx = Docx::new();

    for (i, path) in paths.iter().enumerate() {
        let bytes = std::fs::read(path).map_err(|e| ConvertError::Assembly {
            detail: format!("failed to read page image '{}': {e}", path.display()),
        })?;

        // Validate decodability before handing the bytes to the document
        // writer, and take the authoritative dimensions from the bytes
        // themselves.
        let decoded = image::load_from_memory(&bytes).map_err(|e| ConvertError::Assembly {
            detail: format!("cannot embed '{}': {e}", path.display()),
        })?;
        let (px_w, px_h) = (decoded.width() as u64, decoded.height() as u64);

        let height_emu = width_emu * px_h / px_w;
        let pic = Pic::new(&bytes).size(width_emu as u32, height_emu as u32);
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)));
        debug!(
            "embedded '{}' at {}x{} EMU",
            path.display(),
            width_emu,
            height_emu
        );

        if i + 1 < paths.len() {
            docx = docx
                .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
    }

    let file = std::fs::File::create(output_path).map_err(|e| ConvertError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    docx.build()
        .pack(file)
        .map_err(|e| ConvertError::Assembly {
            detail: format!("failed to pack document: {e}"),
        })?;

    info!(
        "assembled {} pages into {}",
        paths.len(),
        output_path.display()
    );
    Ok(paths.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::write_jpeg;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    fn write_page(dir: &Path, index: u32) -> PageImage {
        let path = dir.join(format!("page_{index}.jpg"));
        let img = RgbImage::from_pixel(64, 48, Rgb([10, 20, (index * 20) as u8]));
        write_jpeg(&path, &img, 75).expect("write test raster");
        PageImage {
            index,
            path,
            width: 64,
            height: 48,
        }
    }

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn empty_sequence_is_an_assembly_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");

        let err = assemble(&[], &out, &config()).expect_err("empty sequence must fail");
        assert!(matches!(err, ConvertError::Assembly { .. }), "got: {err}");
        assert!(!out.exists(), "no output file may be created on failure");
    }

    #[test]
    fn gapped_sequence_is_rejected() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");
        let pages = vec![write_page(dir.path(), 1), write_page(dir.path(), 3)];

        let err = assemble(&pages, &out, &config()).expect_err("gap must be rejected");
        assert!(matches!(err, ConvertError::Assembly { .. }), "got: {err}");
    }

    #[test]
    fn reordered_sequence_is_rejected() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");
        let mut pages = vec![write_page(dir.path(), 1), write_page(dir.path(), 2)];
        pages.swap(0, 1);

        let err = assemble(&pages, &out, &config()).expect_err("reorder must be rejected");
        assert!(matches!(err, ConvertError::Assembly { .. }), "got: {err}");
    }

    #[test]
    fn assembles_one_image_per_page() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");
        let pages: Vec<PageImage> = (1..=3).map(|i| write_page(dir.path(), i)).collect();

        assemble(&pages, &out, &config()).expect("assembly should succeed");

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"PK"), "output must be a zip container");
        // Every embedded image appears as a word/media/ entry (once in the
        // local header, once in the central directory).
        assert!(
            count_occurrences(&bytes, b"word/media/") >= 3,
            "expected 3 embedded media entries"
        );
    }

    #[test]
    fn corrupt_image_bytes_are_an_assembly_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");
        let good = write_page(dir.path(), 1);
        let bad_path = dir.path().join("page_2.jpg");
        std::fs::write(&bad_path, b"not an image").unwrap();
        let pages = vec![
            good,
            PageImage {
                index: 2,
                path: bad_path,
                width: 64,
                height: 48,
            },
        ];

        let err = assemble(&pages, &out, &config()).expect_err("corrupt bytes must fail");
        assert!(matches!(err, ConvertError::Assembly { .. }), "got: {err}");
    }

    #[test]
    fn directory_fallback_embeds_in_natural_order() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");
        // Write out of order on purpose; enumeration must recover 1, 2, 10.
        for index in [10, 1, 2] {
            write_page(dir.path(), index);
        }

        let count =
            assemble_from_dir(dir.path(), &out, &config()).expect("assembly should succeed");
        assert_eq!(count, 3);
        assert!(out.exists());
    }

    #[test]
    fn directory_fallback_with_no_images_is_an_assembly_error() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.docx");

        let err = assemble_from_dir(dir.path(), &out, &config())
            .expect_err("empty directory must fail");
        assert!(matches!(err, ConvertError::Assembly { .. }), "got: {err}");
        assert!(!out.exists());
    }
}
