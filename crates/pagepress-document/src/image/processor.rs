// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode a photo, read its EXIF orientation, turn it upright
// and stage it as a temporary file in its original format.

use std::path::Path;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use pagepress_core::error::PagepressError;
use pagepress_core::{ExifRotation, ImageKind};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// A decoded image together with the format it was stored in.
///
/// Transformations consume `self` and return a new `ImageProcessor`.
///
/// ```ignore
/// let staged = ImageProcessor::open("IMG_0042.jpg")?
///     .auto_orient()
///     .stage()?;
/// let upright = staged.load()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
    /// Container format of the source file.
    kind: ImageKind,
    /// Rotation requested by the source's EXIF orientation tag.
    rotation: ExifRotation,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an image file and read its EXIF orientation.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PagepressError> {
        let path = path.as_ref();
        let kind = crate::discover::sniff_file(path)?;

        let decode_err = |err: image::ImageError| {
            PagepressError::ImageDecode(format!("failed to decode {}: {}", path.display(), err))
        };

        let mut reader = ImageReader::open(path)?;
        if let Some(format) = image_format(kind) {
            reader.set_format(format);
        } else {
            reader = reader.with_guessed_format()?;
        }

        let mut decoder = reader.into_decoder().map_err(decode_err)?;
        // A broken EXIF block is not worth failing the page over.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        let rotation = ExifRotation::from_exif(exif_value(orientation));

        info!(
            width = image.width(),
            height = image.height(),
            ?kind,
            ?rotation,
            "Image loaded"
        );
        Ok(Self {
            image,
            kind,
            rotation,
        })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage, kind: ImageKind, rotation: ExifRotation) -> Self {
        Self {
            image,
            kind,
            rotation,
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Format the source file was sniffed as.
    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Rotation still pending from the EXIF tag.
    pub fn rotation(&self) -> ExifRotation {
        self.rotation
    }

    /// Borrow the current pixels.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Apply the rotation recorded in the EXIF tag. Quarter turns swap the
    /// canvas dimensions, so nothing is cropped.
    pub fn auto_orient(self) -> Self {
        let rotation = self.rotation;
        let mut oriented = self.rotate(rotation);
        oriented.rotation = ExifRotation::None;
        oriented
    }

    /// Rotate counter-clockwise by a quarter-turn multiple.
    #[instrument(skip(self))]
    pub fn rotate(self, rotation: ExifRotation) -> Self {
        // `image` rotates clockwise.
        let image = match rotation {
            ExifRotation::None => return self,
            ExifRotation::Ccw90 => self.image.rotate270(),
            ExifRotation::Ccw180 => self.image.rotate180(),
            ExifRotation::Ccw270 => self.image.rotate90(),
        };
        debug!(
            degrees = rotation.degrees(),
            swapped = rotation.swaps_axes(),
            new_w = image.width(),
            new_h = image.height(),
            "Rotation applied"
        );
        Self { image, ..self }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the current pixels to a temporary file in the source's format.
    ///
    /// The file is deleted when the returned [`StagedImage`] is dropped,
    /// whichever way the caller exits.
    #[instrument(skip(self), fields(kind = ?self.kind))]
    pub fn stage(&self) -> Result<StagedImage, PagepressError> {
        let format = image_format(self.kind).ok_or_else(|| {
            PagepressError::ImageEncode(format!("cannot re-encode {:?} image", self.kind))
        })?;

        let file = tempfile::Builder::new()
            .prefix("pagepress-")
            .suffix(&format!(".{}", self.kind.extension()))
            .tempfile()?;

        self.image
            .save_with_format(file.path(), format)
            .map_err(|err| {
                PagepressError::ImageEncode(format!(
                    "failed to write {}: {}",
                    file.path().display(),
                    err
                ))
            })?;

        debug!(path = %file.path().display(), "Image staged");
        Ok(StagedImage {
            file,
            format,
        })
    }
}

/// An image persisted to a scoped temporary file.
pub struct StagedImage {
    file: NamedTempFile,
    format: ImageFormat,
}

impl StagedImage {
    /// Location of the temporary file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Pixel dimensions as stored in the staged file.
    pub fn dimensions(&self) -> Result<(u32, u32), PagepressError> {
        let mut reader = ImageReader::open(self.file.path())?;
        reader.set_format(self.format);
        reader.into_dimensions().map_err(|err| {
            PagepressError::ImageDecode(format!("staged image unreadable: {}", err))
        })
    }

    /// Decode the staged file.
    pub fn load(&self) -> Result<DynamicImage, PagepressError> {
        let mut reader = ImageReader::open(self.file.path())?;
        reader.set_format(self.format);
        reader.decode().map_err(|err| {
            PagepressError::ImageDecode(format!("staged image unreadable: {}", err))
        })
    }
}

/// `image` crate format for a sniffed kind.
fn image_format(kind: ImageKind) -> Option<ImageFormat> {
    match kind {
        ImageKind::Png => Some(ImageFormat::Png),
        ImageKind::Jpeg => Some(ImageFormat::Jpeg),
        ImageKind::Bmp => Some(ImageFormat::Bmp),
        ImageKind::Gif => Some(ImageFormat::Gif),
        ImageKind::Webp => Some(ImageFormat::WebP),
        ImageKind::Avif => Some(ImageFormat::Avif),
        ImageKind::Unknown => None,
    }
}

/// Raw EXIF value (tag 0x0112) for a decoder-reported orientation.
fn exif_value(orientation: Orientation) -> u16 {
    match orientation {
        Orientation::NoTransforms => 1,
        Orientation::FlipHorizontal => 2,
        Orientation::Rotate180 => 3,
        Orientation::FlipVertical => 4,
        Orientation::Rotate90FlipH => 5,
        Orientation::Rotate90 => 6,
        Orientation::Rotate270FlipH => 7,
        Orientation::Rotate270 => 8,
    }
}
