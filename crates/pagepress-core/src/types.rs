// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for pagepress.

/// PDF points per millimetre (1 pt = 1/72 inch).
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Raster formats recognised by content sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Webp,
    Avif,
    /// Anything we do not embed: text, PDFs, truncated files, TIFF, ...
    Unknown,
}

impl ImageKind {
    /// Number of leading bytes [`ImageKind::sniff`] needs to decide.
    pub const SNIFF_LEN: usize = 12;

    /// Classify a file by its leading bytes. Extensions are never consulted.
    pub fn sniff(header: &[u8]) -> Self {
        if header.starts_with(b"\x89PNG\r\n\x1a\n") {
            Self::Png
        } else if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
            Self::Gif
        } else if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP" {
            Self::Webp
        } else if header.len() >= 12
            && &header[4..8] == b"ftyp"
            && matches!(&header[8..12], b"avif" | b"avis")
        {
            Self::Avif
        } else if header.starts_with(b"BM") {
            Self::Bmp
        } else {
            Self::Unknown
        }
    }

    /// Whether files of this kind end up as pages.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Canonical file extension, used for temporary artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Unknown => "bin",
        }
    }

    /// MIME type, reported in discovery logs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Paper sizes pages can be laid out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    /// ISO A5 portrait, 148 x 210 mm.
    A5,
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A5 => (148, 210),
        }
    }

    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        (w_mm as f32 * POINTS_PER_MM, h_mm as f32 * POINTS_PER_MM)
    }
}

/// Counter-clockwise quarter turn needed to display an image upright,
/// derived from its EXIF orientation tag (0x0112).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifRotation {
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl ExifRotation {
    /// Map a raw EXIF orientation value. Mirrored orientations (2, 4, 5, 7)
    /// and unknown values are left untouched.
    pub fn from_exif(orientation: u16) -> Self {
        match orientation {
            3 => Self::Ccw180,
            6 => Self::Ccw270,
            8 => Self::Ccw90,
            _ => Self::None,
        }
    }

    /// Counter-clockwise angle in degrees.
    pub fn degrees(&self) -> u16 {
        match self {
            Self::None => 0,
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    /// Whether the rotation swaps width and height.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Self::Ccw90 | Self::Ccw270)
    }
}
