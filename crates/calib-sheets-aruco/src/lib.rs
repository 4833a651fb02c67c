//! ArUco marker dictionaries, rasterization and detection.
//!
//! This crate focuses on:
//! - embedded built-in dictionaries (compiled into the binary from `data/`),
//! - loading further code tables from JSON at runtime,
//! - matching observed marker codes against a dictionary,
//! - rendering single markers and decoding them back from axis-aligned images.

pub mod builtins;
mod detect;
mod dictionary;
mod matcher;
mod render;
mod threshold;

pub use detect::{detect_markers, DetectorParams, MarkerDetection, MarkerDetector};
pub use dictionary::{resolve_dictionary, Dictionary, DictionaryError, DictionaryFile};
pub use matcher::{rotate_code, Match, Matcher};
pub use render::{render_marker, RenderError};
