//! Export settings: the partial override blocks that rules files and CLI flags
//! supply, and the fully resolved [`Settings`] record each file is exported
//! with.
//!
//! An [`OverrideBlock`] may define any subset of the three fields. The
//! resolver (see [`crate::pipeline::resolve`]) merges several blocks into one
//! [`Settings`], field by field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output size in pixels. Both dimensions are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Returns `None` when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Why a `W,H` string could not be parsed into a [`Size`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    #[error("expected 'width,height' (two comma-separated values, no space), got '{0}'")]
    WrongShape(String),

    #[error("'{0}' is not a positive integer")]
    NotPositive(String),
}

impl FromStr for Size {
    type Err = SizeParseError;

    /// Parses `"W,H"`, e.g. `"50,50"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        let [w, h] = parts.as_slice() else {
            return Err(SizeParseError::WrongShape(s.to_string()));
        };
        let dim = |t: &str| -> Result<u32, SizeParseError> {
            t.parse::<u32>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| SizeParseError::NotPositive(t.to_string()))
        };
        Ok(Size {
            width: dim(*w)?,
            height: dim(*h)?,
        })
    }
}

/// A size value as written in an override layer.
///
/// `Natural` is the explicit "use Inkscape's own size" choice (the rules
/// file's `"default"` keyword). It stops the search through lower layers,
/// unlike an absent size which falls through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeOverride {
    Natural,
    Fixed(Size),
}

impl SizeOverride {
    pub fn as_size(self) -> Option<Size> {
        match self {
            SizeOverride::Natural => None,
            SizeOverride::Fixed(size) => Some(size),
        }
    }
}

/// One partial layer of export settings. `None` means "not defined here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideBlock {
    pub size: Option<SizeOverride>,
    pub format: Option<String>,
    pub drawing_only: Option<bool>,
}

impl OverrideBlock {
    /// A block that defines nothing.
    pub const EMPTY: OverrideBlock = OverrideBlock {
        size: None,
        format: None,
        drawing_only: None,
    };

    /// The lowest-precedence layer: PNG, drawing area only, natural size.
    ///
    /// Defines every field, so resolution against it never fails.
    pub fn builtin_defaults() -> Self {
        Self {
            size: Some(SizeOverride::Natural),
            format: Some("png".to_string()),
            drawing_only: Some(true),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.format.is_none() && self.drawing_only.is_none()
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(SizeOverride::Fixed(size));
        self
    }

    pub fn with_natural_size(mut self) -> Self {
        self.size = Some(SizeOverride::Natural);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_drawing_only(mut self, drawing_only: bool) -> Self {
        self.drawing_only = Some(drawing_only);
        self
    }
}

/// Fully resolved settings for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// `None` exports at Inkscape's natural size.
    pub size: Option<Size>,
    /// Lowercase target format name, also used as the output extension.
    pub format: String,
    /// `true` exports the drawing's bounding box, `false` the whole page.
    pub drawing_only: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self
            .size
            .map_or_else(|| "natural".to_string(), |s| s.to_string());
        let area = if self.drawing_only { "drawing" } else { "page" };
        write!(f, "{} @ {size}, {area}", self.format)
    }
}
