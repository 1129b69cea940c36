// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page layout, single-page rendering and output assembly.

pub mod assembler;
pub mod layout;
pub mod writer;

pub use assembler::OutputDocument;
pub use layout::{Placement, fit_centered};
pub use writer::PageRenderer;
