// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pagepress.

use thiserror::Error;

/// Top-level error type for all pagepress operations.
#[derive(Debug, Error)]
pub enum PagepressError {
    // -- Invocation errors --
    /// The command line asked for something we refuse to do (bad output
    /// extension, directory without recursion). Nothing has been written.
    #[error("{0}")]
    Usage(String),

    // -- Image errors --
    #[error("image decoding failed: {0}")]
    ImageDecode(String),

    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page {actual} cannot be inserted, next free page index is {expected}")]
    PageIndex { expected: usize, actual: usize },

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PagepressError {
    /// Whether this error is a usage mistake rather than a processing fault.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagepressError>;
