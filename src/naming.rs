//! Output naming and natural ordering.
//!
//! ## Why reserve with `create_new`?
//!
//! The naming rule itself is simple — strip `.pdf`, append `_converted`,
//! disambiguate with `_1`, `_2`, … — but a check-then-create sequence leaves
//! a window where two concurrent jobs converting `report.pdf` both observe
//! `report_converted.docx` as free. Reserving the name by creating the file
//! with `create_new(true)` makes the probe and the claim one atomic
//! filesystem operation, so no two jobs can ever be handed the same output
//! path. The assembler later truncates and overwrites the reserved file.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder used when the caller declared no input filename.
pub const DEFAULT_INPUT_NAME: &str = "document.pdf";

/// Suffix appended to the stripped input name to form the output base name.
const OUTPUT_SUFFIX: &str = "_converted";

/// Extension of the produced document.
const OUTPUT_EXT: &str = "docx";

static RE_PDF_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// Derive the output base name (no extension, no disambiguator) from the
/// declared input filename.
///
/// A trailing `.pdf` is stripped case-insensitively; an absent or empty
/// declared name falls back to [`DEFAULT_INPUT_NAME`].
pub fn output_base_name(declared: Option<&str>) -> String {
    let declared = match declared {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_INPUT_NAME,
    };
    format!("{}{}", RE_PDF_EXT.replace(declared, ""), OUTPUT_SUFFIX)
}

/// Reserve a collision-free output filename in `dir`.
///
/// Probes `<base>.docx`, `<base>_1.docx`, `<base>_2.docx`, … and claims the
/// first free name atomically. Returns the reserved path and the bare
/// filename.
pub fn reserve_output_path(
    dir: &Path,
    declared: Option<&str>,
) -> io::Result<(PathBuf, String)> {
    let base = output_base_name(declared);
    let mut count = 0u32;
    loop {
        let filename = if count == 0 {
            format!("{base}.{OUTPUT_EXT}")
        } else {
            format!("{base}_{count}.{OUTPUT_EXT}")
        };
        let candidate = dir.join(&filename);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(_) => {
                debug!("reserved output name: {}", candidate.display());
                return Ok((candidate, filename));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => count += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Compare two strings in natural order.
///
/// Names are split into alternating non-digit/digit runs; digit runs compare
/// by numeric value (so `page_2` sorts before `page_10`), non-digit runs
/// compare case-insensitively. Required wherever page files are enumerated
/// from storage rather than tracked as typed sequence data, since directory
/// iteration order is implementation-defined.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let xs = take_digit_run(&mut ai);
                let ys = take_digit_run(&mut bi);
                // Compare digit runs numerically without parsing: after
                // stripping leading zeros, a longer run is a larger number,
                // and equal-length runs compare lexically.
                let xt = xs.trim_start_matches('0');
                let yt = ys.trim_start_matches('0');
                let ord = xt.len().cmp(&yt.len()).then_with(|| xt.cmp(yt));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digit_run(iter: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = iter.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        iter.next();
    }
    run
}

/// Enumerate page raster files (`.jpg`/`.jpeg`) in `dir`, naturally ordered.
///
/// Fallback compatibility mode for callers that did not keep the typed
/// [`crate::output::PageImage`] sequence; the orchestrator itself never
/// depends on it.
pub fn list_page_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false)
        })
        .collect();
    files.sort_by(|a, b| {
        let an = a.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let bn = b.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        natural_cmp(an, bn)
    });
    Ok(files)
}
