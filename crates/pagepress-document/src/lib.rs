// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagepress-document: Turning image files into an A5 PDF.
//
// Provides image discovery (content-sniffed, optionally recursive), image
// processing (decode, EXIF orientation, temporary staging), page layout and
// rendering, and assembly of the output document.

pub mod convert;
pub mod discover;
pub mod image;
pub mod pdf;

// Re-export the primary items so callers can use `pagepress_document::convert` etc.
pub use convert::{ConversionSummary, convert};
pub use discover::{Discoverer, discover};
pub use self::image::processor::ImageProcessor;
pub use pdf::assembler::OutputDocument;
pub use pdf::writer::PageRenderer;
