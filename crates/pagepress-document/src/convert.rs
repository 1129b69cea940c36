// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Images-to-PDF conversion driver.
//
// Validates the request, feeds discovered images into the output document one
// page at a time, and writes the result. The output is serialised into a
// temporary file next to the target and renamed into place only once every
// page has been composed, so a failed run leaves no half-written PDF behind.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use pagepress_core::ConversionConfig;
use pagepress_core::error::{PagepressError, Result};
use tracing::{info, instrument};

use crate::discover::Discoverer;
use crate::pdf::{OutputDocument, PageRenderer};

/// Printed when the output name does not end in `.pdf`.
pub const BAD_EXTENSION_MESSAGE: &str = "File name should have .pdf extension";
/// Printed when a directory is given without recursion.
pub const NEEDS_RECURSIVE_MESSAGE: &str = "Please use -r option";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Pages written, one per discovered image.
    pub pages: usize,
    /// Where the document was written.
    pub output: PathBuf,
}

/// Reject requests that must not produce any output.
pub fn validate(config: &ConversionConfig, inputs: &[PathBuf], output: &Path) -> Result<()> {
    // Case-sensitive on purpose: `out.PDF` is refused.
    if output.extension() != Some(OsStr::new("pdf")) {
        return Err(PagepressError::Usage(BAD_EXTENSION_MESSAGE.into()));
    }
    if !config.recursive && inputs.iter().any(|path| path.is_dir()) {
        return Err(PagepressError::Usage(NEEDS_RECURSIVE_MESSAGE.into()));
    }
    Ok(())
}

/// Convert every image discovered under `inputs` into one PDF at `output`.
///
/// Pages appear in discovery order. An input list without any images still
/// produces a valid, empty document.
#[instrument(skip(config, inputs), fields(inputs = inputs.len(), recursive = config.recursive))]
pub fn convert(
    config: &ConversionConfig,
    inputs: &[PathBuf],
    output: &Path,
) -> Result<ConversionSummary> {
    validate(config, inputs, output)?;

    let renderer = PageRenderer::new(config.paper_size, config.content_fraction);
    let mut document = OutputDocument::new(renderer);

    for (index, image_path) in Discoverer::new(inputs.iter().cloned(), config.recursive).enumerate()
    {
        document.insert_image_page(&image_path, index)?;
    }

    write_atomically(&mut document, output)?;

    let summary = ConversionSummary {
        pages: document.page_count(),
        output: output.to_path_buf(),
    };
    info!(pages = summary.pages, output = %output.display(), "Conversion complete");
    Ok(summary)
}

/// Serialise into a sibling temporary file, then rename it over `output`.
fn write_atomically(document: &mut OutputDocument, output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = tempfile::Builder::new()
        .prefix(".images2pdf-")
        .suffix(".part")
        .tempfile_in(dir)?;
    document.save_to(staging.as_file_mut())?;
    staging.as_file().sync_all()?;
    staging.persist(output).map_err(|err| PagepressError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use lopdf::Document;
    use std::fs;

    fn write_png(path: &Path, width: u32, height: u32) {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 20, 30])))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn page_count(path: &Path) -> usize {
        Document::load(path).unwrap().get_pages().len()
    }

    #[test]
    fn wrong_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        write_png(&image, 4, 4);
        let output = dir.path().join("out.txt");

        let err = convert(&ConversionConfig::default(), &[image], &output).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), BAD_EXTENSION_MESSAGE);
        assert!(!output.exists());
    }

    #[test]
    fn extension_check_is_case_sensitive() {
        let config = ConversionConfig::default();
        assert!(validate(&config, &[], Path::new("out.pdf")).is_ok());
        assert!(validate(&config, &[], Path::new("out.PDF")).is_err());
        assert!(validate(&config, &[], Path::new(".pdf")).is_err());
        assert!(validate(&config, &[], Path::new("out.pdf.txt")).is_err());
    }

    #[test]
    fn directory_without_recursion_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();
        write_png(&photos.join("a.png"), 4, 4);
        let output = dir.path().join("album.pdf");

        let err = convert(&ConversionConfig::default(), &[photos], &output).unwrap_err();
        assert_eq!(err.to_string(), NEEDS_RECURSIVE_MESSAGE);
        assert!(!output.exists());
    }

    #[test]
    fn recursive_directory_becomes_one_page_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir_all(photos.join("2025")).unwrap();
        write_png(&photos.join("a.png"), 30, 40);
        write_png(&photos.join("2025/b.png"), 40, 30);
        fs::write(photos.join("README.txt"), "holiday pictures").unwrap();
        let output = dir.path().join("album.pdf");

        let summary =
            convert(&ConversionConfig::with_recursive(true), &[photos], &output).unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.output, output);
        assert_eq!(page_count(&output), 2);
    }

    #[test]
    fn non_images_are_silently_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("1.png");
        let notes = dir.path().join("notes.txt");
        let second = dir.path().join("2.png");
        write_png(&first, 8, 8);
        fs::write(&notes, "shopping list").unwrap();
        write_png(&second, 8, 16);
        let output = dir.path().join("out.pdf");

        let summary = convert(
            &ConversionConfig::default(),
            &[first, notes, dir.path().join("absent.png"), second],
            &output,
        )
        .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(page_count(&output), 2);
    }

    #[test]
    fn no_images_still_writes_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "nothing to see").unwrap();
        let output = dir.path().join("empty.pdf");

        let summary = convert(&ConversionConfig::default(), &[notes], &output).unwrap();
        assert_eq!(summary.pages, 0);
        assert_eq!(page_count(&output), 0);
    }

    #[test]
    fn failed_page_leaves_no_output_or_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        write_png(&good, 8, 8);
        let bad = dir.path().join("bad.png");
        fs::write(&bad, b"\x89PNG\r\n\x1a\ntruncated").unwrap();
        let output = dir.path().join("out.pdf");

        let err = convert(&ConversionConfig::default(), &[good, bad], &output).unwrap_err();
        assert!(matches!(err, PagepressError::ImageDecode(_)));
        assert!(!output.exists());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn existing_output_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("img.png");
        write_png(&image, 5, 5);
        let output = dir.path().join("out.pdf");
        fs::write(&output, "stale").unwrap();

        convert(&ConversionConfig::default(), &[image], &output).unwrap();
        assert_eq!(page_count(&output), 1);
    }

    #[cfg(feature = "avif")]
    #[test]
    fn avif_input_becomes_a_page() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("still.avif");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([120, 60, 200])))
            .save_with_format(&image, ImageFormat::Avif)
            .unwrap();
        let output = dir.path().join("out.pdf");

        let summary = convert(&ConversionConfig::default(), &[image], &output).unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(page_count(&output), 1);
    }
}
