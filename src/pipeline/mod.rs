//! Pipeline stages for SVG batch export.
//!
//! Each submodule implements exactly one step. Only [`route`] and [`relay`]
//! touch files other than the inputs.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ resolve ──▶ route ──┬──▶ command ──▶ Inkscape ──▶ output
//! (disk)    (rules)             └──▶ command ──▶ Inkscape ──▶ relay ──▶ output
//!                                                  (png)      (image)
//! ```
//!
//! 1. [`input`]   — list the drawings and load the rules file
//! 2. [`resolve`] — merge the four override layers into one `Settings`
//! 3. [`route`]   — pick native or relay conversion and run it
//! 4. [`command`] — build the Inkscape argument vector for a dialect
//! 5. [`relay`]   — re-encode Inkscape's PNG into a format it cannot write;
//!    CPU-bound, runs in `spawn_blocking`

pub mod command;
pub mod input;
pub mod relay;
pub mod resolve;
pub mod route;
