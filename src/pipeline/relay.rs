//! Relay transcoding: Inkscape's intermediate PNG → a format it cannot write.
//!
//! Runs on a blocking thread (see [`crate::pipeline::route`]); decoding and
//! encoding a large raster is CPU-bound and would stall the async workers.
//!
//! JPEG has no alpha channel. Inkscape's exports usually have a transparent
//! background, and simply dropping alpha would turn it black, so opaque
//! targets are composited onto white first.

use crate::error::FileError;
use crate::format::RelayFormat;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

/// Decode `intermediate` and save it to `output` as `format`.
pub fn transcode(intermediate: &Path, output: &Path, format: RelayFormat) -> Result<(), FileError> {
    let image_format = format.image_format();
    if !image_format.writing_enabled() {
        return Err(FileError::RelayLibraryMissing {
            format: format.name().to_string(),
        });
    }

    let img = image::open(intermediate).map_err(|e| FileError::RelayIo {
        path: intermediate.to_path_buf(),
        detail: e.to_string(),
    })?;

    let img = if format.is_opaque() {
        flatten_onto_white(&img)
    } else {
        img
    };

    img.save_with_format(output, image_format)
        .map_err(|e| FileError::RelayIo {
            path: output.to_path_buf(),
            detail: e.to_string(),
        })?;

    debug!(
        "Relayed {} → {} ({}x{})",
        intermediate.display(),
        output.display(),
        img.width(),
        img.height()
    );
    Ok(())
}

/// Alpha-composite every pixel over an opaque white background.
fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = u32::from(px[3]);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }

    DynamicImage::ImageRgb8(rgb)
}
