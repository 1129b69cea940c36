// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout: where an image goes on its page.

/// Rectangle occupied by the image, in PDF points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Centre an image of `image_px` pixels on a `page_pt` page.
///
/// Portrait and square images get `fraction` of the page height, landscape
/// images `fraction` of the page width. The other side follows from the
/// image's aspect ratio.
pub fn fit_centered(page_pt: (f32, f32), image_px: (u32, u32), fraction: f32) -> Placement {
    let (page_w, page_h) = page_pt;
    let ratio = image_px.1 as f32 / image_px.0 as f32;

    let (width, height) = if ratio >= 1.0 {
        let height = page_h * fraction;
        (height / ratio, height)
    } else {
        let width = page_w * fraction;
        (width, width * ratio)
    };

    Placement {
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
    }
}
