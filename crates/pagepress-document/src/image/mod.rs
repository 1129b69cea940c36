// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decoding, EXIF orientation correction and temporary staging.

pub mod processor;

pub use processor::{ImageProcessor, StagedImage};
