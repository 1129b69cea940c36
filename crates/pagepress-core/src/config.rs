// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration.

/// Settings for one images-to-PDF run.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Page size of every output page.
    pub paper_size: crate::PaperSize,
    /// Share of the limiting page dimension the image occupies.
    pub content_fraction: f32,
    /// Descend into directories given as inputs.
    pub recursive: bool,
}

impl ConversionConfig {
    /// Default settings with recursion switched on or off.
    pub fn with_recursive(recursive: bool) -> Self {
        Self {
            recursive,
            ..Self::default()
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            paper_size: crate::PaperSize::A5,
            content_fraction: 5.0 / 6.0,
            recursive: false,
        }
    }
}
