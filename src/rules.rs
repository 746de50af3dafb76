//! Rules documents: per-file and global export overrides loaded from JSON.
//!
//! ```json
//! {
//!   "_globalrule_": { "size": [300, 300] },
//!   "gauge":        { "format": "gif" },
//!   "icon":         { "size": "default", "drawing_only": false }
//! }
//! ```
//!
//! Top-level keys are file stems (the input name without `.svg`) or the
//! reserved [`GLOBAL_RULE_KEY`]. Each block may set any subset of `size`,
//! `format` and `drawing_only`. The `"default"` size keyword is turned into
//! [`SizeOverride::Natural`] here, once, so nothing downstream ever compares
//! against the string.

use crate::settings::{OverrideBlock, Size, SizeOverride};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Key of the block applied to every file.
pub const GLOBAL_RULE_KEY: &str = "_globalrule_";

/// Keyword accepted in place of a `[width, height]` size.
pub const NATURAL_SIZE_KEYWORD: &str = "default";

static EMPTY_BLOCK: OverrideBlock = OverrideBlock::EMPTY;

/// Why a rules document was rejected.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Not valid JSON at all.
    #[error("not a valid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON whose top level is not an object.
    #[error("top level must be an object mapping file names to rules")]
    NotAnObject,

    /// One block has a malformed field.
    #[error("rule '{key}': {detail}")]
    InvalidBlock { key: String, detail: String },
}

/// In-memory rules: one optional global block plus per-stem blocks.
///
/// Read-only once loaded; shared by reference across every conversion.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    global: OverrideBlock,
    files: HashMap<String, OverrideBlock>,
}

impl RuleStore {
    /// Parse and validate a rules document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, RuleError> {
        let document: Value = serde_json::from_str(text)?;
        Self::load(&document)
    }

    /// Build a store from an already-parsed rules document.
    pub fn load(document: &Value) -> Result<Self, RuleError> {
        let entries = document.as_object().ok_or(RuleError::NotAnObject)?;

        let mut store = RuleStore::default();
        for (key, value) in entries {
            let block = parse_block(key, value)?;
            if key == GLOBAL_RULE_KEY {
                store.global = block;
            } else {
                store.files.insert(key.clone(), block);
            }
        }
        Ok(store)
    }

    /// The `_globalrule_` block, or an empty block when absent.
    pub fn global_block(&self) -> &OverrideBlock {
        &self.global
    }

    /// The block for `stem`, or an empty block when the document has none.
    pub fn block_for(&self, stem: &str) -> &OverrideBlock {
        self.files.get(stem).unwrap_or(&EMPTY_BLOCK)
    }

    /// Number of per-file blocks (the global block is not counted).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.global.is_empty()
    }

    /// Per-file keys that name none of `stems`, sorted.
    pub fn unmatched_keys<'a, I>(&self, stems: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: std::collections::HashSet<&str> = stems.into_iter().collect();
        let mut keys: Vec<&str> = self
            .files
            .keys()
            .map(String::as_str)
            .filter(|k| !known.contains(k))
            .collect();
        keys.sort_unstable();
        keys
    }
}

fn parse_block(key: &str, value: &Value) -> Result<OverrideBlock, RuleError> {
    let invalid = |detail: String| RuleError::InvalidBlock {
        key: key.to_string(),
        detail,
    };

    let fields: &Map<String, Value> = value
        .as_object()
        .ok_or_else(|| invalid(format!("expected an object, got {value}")))?;

    let size = match fields.get("size") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_size(v).map_err(invalid)?),
    };

    let format = match fields.get("format") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(other) => return Err(invalid(format!("format must be a non-empty string, got {other}"))),
    };

    let drawing_only = match fields.get("drawing_only") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => return Err(invalid(format!("drawing_only must be true or false, got {other}"))),
    };

    Ok(OverrideBlock {
        size,
        format,
        drawing_only,
    })
}

fn parse_size(value: &Value) -> Result<SizeOverride, String> {
    match value {
        Value::String(s) if s == NATURAL_SIZE_KEYWORD => Ok(SizeOverride::Natural),
        Value::Array(dims) if dims.len() == 2 => {
            let dim = |v: &Value| {
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|&n| n > 0)
            };
            match (dim(&dims[0]), dim(&dims[1])) {
                (Some(width), Some(height)) => Ok(SizeOverride::Fixed(Size { width, height })),
                _ => Err(format!("size dimensions must be positive integers, got {value}")),
            }
        }
        other => Err(format!(
            "size must be [width, height] or \"{NATURAL_SIZE_KEYWORD}\", got {other}"
        )),
    }
}
