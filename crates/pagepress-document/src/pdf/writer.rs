// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page renderer: draw one image onto a single-page PDF canvas using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use pagepress_core::PaperSize;
use pagepress_core::error::PagepressError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument, warn};

use super::layout::{Placement, fit_centered};

/// At 72 dpi one image pixel is one point, so scale factors are simply
/// target size over pixel size.
const PLACEMENT_DPI: f32 = 72.0;

/// Renders single images onto page-sized canvases.
pub struct PageRenderer {
    /// Paper size for every rendered page.
    paper_size: PaperSize,
    /// Share of the limiting page dimension given to the image.
    content_fraction: f32,
}

impl PageRenderer {
    /// Create a renderer for `paper_size` pages, giving the image
    /// `content_fraction` of the limiting page dimension.
    pub fn new(paper_size: PaperSize, content_fraction: f32) -> Self {
        Self {
            paper_size,
            content_fraction,
        }
    }

    /// Paper size of every page this renderer produces.
    pub fn paper_size(&self) -> PaperSize {
        self.paper_size
    }

    /// Where an image of the given pixel size lands on the page.
    pub fn placement(&self, image_px: (u32, u32)) -> Placement {
        fit_centered(
            self.paper_size.dimensions_pt(),
            image_px,
            self.content_fraction,
        )
    }

    /// Produce a one-page PDF with `image` centred on it.
    ///
    /// Images carrying an alpha channel are embedded as RGBA so their
    /// transparency survives; everything else is flattened to RGB.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn render(&self, image: &DynamicImage) -> Result<Vec<u8>, PagepressError> {
        let (img_width, img_height) = (image.width(), image.height());
        if img_width == 0 || img_height == 0 {
            return Err(PagepressError::ImageDecode("image has no pixels".into()));
        }

        let (pixels, data_format) = if image.color().has_alpha() {
            (image.to_rgba8().into_raw(), RawImageFormat::RGBA8)
        } else {
            (image.to_rgb8().into_raw(), RawImageFormat::RGB8)
        };
        let raw = RawImage {
            pixels: RawImageData::U8(pixels),
            width: img_width as usize,
            height: img_height as usize,
            data_format,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new("pagepress page");
        let xobject_id = doc.add_image(&raw);

        let placement = self.placement((img_width, img_height));
        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(placement.x)),
                translate_y: Some(Pt(placement.y)),
                scale_x: Some(placement.width / img_width as f32),
                scale_y: Some(placement.height / img_height as f32),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        }];

        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        let page = PdfPage::new(Mm(w_mm as f32), Mm(h_mm as f32), ops);
        doc.with_pages(vec![page]);

        debug!(?placement, "Image placed on page");

        // Pixels go in as decoded. printpdf's image optimisation may otherwise
        // recode them as greyscale or JPEG.
        let options = PdfSaveOptions {
            image_optimization: None,
            ..PdfSaveOptions::default()
        };
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&options, &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving page");
        }

        Ok(output)
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        let config = pagepress_core::ConversionConfig::default();
        Self::new(config.paper_size, config.content_fraction)
    }
}
