//! Output format classification.
//!
//! Every requested format lands in exactly one of three buckets:
//!
//! | Class | Formats | Path |
//! |-------|---------|------|
//! | Native | png, pdf, ps, eps | Inkscape exports directly |
//! | Relay | jpeg, jpg, bmp, gif, tiff, tif, webp, tga, ico | Inkscape → PNG → `image` |
//! | Unsupported | anything else | per-file error |
//!
//! Only PNG takes a pixel size among the native formats; Inkscape has no
//! width/height switch for its vector outputs, so a size is dropped for them.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A format Inkscape can write on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeFormat {
    Png,
    Pdf,
    Ps,
    Eps,
}

impl NativeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            NativeFormat::Png => "png",
            NativeFormat::Pdf => "pdf",
            NativeFormat::Ps => "ps",
            NativeFormat::Eps => "eps",
        }
    }

    /// Whether Inkscape honours `-w`/`-h` for this format.
    pub fn accepts_size(self) -> bool {
        matches!(self, NativeFormat::Png)
    }

    /// Export switch of the Inkscape 0.9x command line, e.g. `--export-png`.
    pub fn legacy_flag(self) -> &'static str {
        match self {
            NativeFormat::Png => "--export-png",
            NativeFormat::Pdf => "--export-pdf",
            NativeFormat::Ps => "--export-ps",
            NativeFormat::Eps => "--export-eps",
        }
    }
}

/// A format reached by transcoding Inkscape's PNG through the `image` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayFormat {
    name: &'static str,
    format: ImageFormat,
}

impl RelayFormat {
    /// Canonical lowercase name, e.g. `"jpeg"` for both `jpg` and `jpeg`.
    pub fn name(self) -> &'static str {
        self.name
    }

    pub fn image_format(self) -> ImageFormat {
        self.format
    }

    /// Formats without an alpha channel; the intermediate is flattened first.
    pub fn is_opaque(self) -> bool {
        matches!(self.format, ImageFormat::Jpeg)
    }
}

/// Which conversion path a format takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    Native(NativeFormat),
    Relay(RelayFormat),
    Unsupported,
}

impl FormatClass {
    pub fn is_supported(self) -> bool {
        !matches!(self, FormatClass::Unsupported)
    }
}

/// Route taken for a converted file, recorded in the batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionRoute {
    Native,
    Relay,
}

impl fmt::Display for ConversionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionRoute::Native => f.write_str("native"),
            ConversionRoute::Relay => f.write_str("relay"),
        }
    }
}

const RELAY_FORMATS: &[(&str, &str, ImageFormat)] = &[
    ("jpeg", "jpeg", ImageFormat::Jpeg),
    ("jpg", "jpeg", ImageFormat::Jpeg),
    ("bmp", "bmp", ImageFormat::Bmp),
    ("gif", "gif", ImageFormat::Gif),
    ("tiff", "tiff", ImageFormat::Tiff),
    ("tif", "tiff", ImageFormat::Tiff),
    ("webp", "webp", ImageFormat::WebP),
    ("tga", "tga", ImageFormat::Tga),
    ("ico", "ico", ImageFormat::Ico),
];

/// Classify a requested output format. Case-insensitive and total.
pub fn classify(name: &str) -> FormatClass {
    let name = name.to_ascii_lowercase();

    let native = match name.as_str() {
        "png" => Some(NativeFormat::Png),
        "pdf" => Some(NativeFormat::Pdf),
        "ps" => Some(NativeFormat::Ps),
        "eps" => Some(NativeFormat::Eps),
        _ => None,
    };
    if let Some(native) = native {
        return FormatClass::Native(native);
    }

    RELAY_FORMATS
        .iter()
        .find(|(alias, _, _)| *alias == name)
        .map_or(FormatClass::Unsupported, |&(_, canonical, format)| {
            FormatClass::Relay(RelayFormat {
                name: canonical,
                format,
            })
        })
}

/// Every format name [`classify`] accepts, for help text.
pub fn supported_formats() -> Vec<&'static str> {
    let mut names = vec!["png", "pdf", "ps", "eps"];
    names.extend(RELAY_FORMATS.iter().map(|(alias, _, _)| *alias));
    names
}
