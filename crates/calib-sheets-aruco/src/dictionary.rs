//! Dictionary metadata, packed marker codes and JSON code tables.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::{fs, path::Path};

use crate::builtins;

/// A fixed ArUco-style dictionary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    /// OpenCV-style name, e.g. `DICT_4X4_50`.
    pub name: Cow<'static, str>,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order (`idx = y * marker_size + x`) with **black = 1**.
    pub codes: Cow<'static, [u64]>,
}

/// Errors while resolving or loading a dictionary.
#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error(
        "dictionary {name} is not built in (built-ins: {builtins}); load its code table with --dictionary-file"
    )]
    Unknown { name: String, builtins: String },
    #[error("dictionary {name}: marker_size {marker_size} needs more than 64 bits")]
    TooManyBits { name: String, marker_size: usize },
    #[error("dictionary {name} has no codes")]
    Empty { name: String },
    #[error("dictionary {name}: code #{index} ({code:#x}) has bits outside the {bits}-bit grid")]
    CodeOutOfRange {
        name: String,
        index: usize,
        code: u64,
        bits: usize,
    },
    #[error("dictionary file is {found}, expected {expected}")]
    NameMismatch { expected: String, found: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// On-disk code table, same layout as the embedded `data/*_CODES.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub name: String,
    pub marker_size: usize,
    #[serde(default)]
    pub max_correction_bits: u8,
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of marker ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Code for a marker id.
    #[inline]
    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Build an owned dictionary from a parsed code table, validating every code.
    pub fn from_table(table: DictionaryFile) -> Result<Self, DictionaryError> {
        let bits = table.marker_size * table.marker_size;
        if bits > 64 {
            return Err(DictionaryError::TooManyBits {
                name: table.name,
                marker_size: table.marker_size,
            });
        }
        if table.codes.is_empty() {
            return Err(DictionaryError::Empty { name: table.name });
        }
        let mask = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        if let Some((index, &code)) = table
            .codes
            .iter()
            .enumerate()
            .find(|&(_, &c)| c & !mask != 0)
        {
            return Err(DictionaryError::CodeOutOfRange {
                name: table.name,
                index,
                code,
                bits,
            });
        }

        Ok(Self {
            name: Cow::Owned(table.name),
            marker_size: table.marker_size,
            max_correction_bits: table.max_correction_bits,
            codes: Cow::Owned(table.codes),
        })
    }

    /// Parse a JSON code table.
    pub fn from_json_str(raw: &str) -> Result<Self, DictionaryError> {
        Self::from_table(serde_json::from_str(raw)?)
    }

    /// Load a JSON code table from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Serialize to the on-disk table layout.
    pub fn to_table(&self) -> DictionaryFile {
        DictionaryFile {
            name: self.name.to_string(),
            marker_size: self.marker_size,
            max_correction_bits: self.max_correction_bits,
            codes: self.codes.to_vec(),
        }
    }
}

/// Resolve a dictionary by name.
///
/// With `file`, the table is loaded from disk and its name must match `name`.
/// Otherwise `name` must be one of the embedded builtins.
pub fn resolve_dictionary(name: &str, file: Option<&Path>) -> Result<Dictionary, DictionaryError> {
    if let Some(path) = file {
        let dict = Dictionary::load_json(path)?;
        if dict.name != name {
            return Err(DictionaryError::NameMismatch {
                expected: name.to_string(),
                found: dict.name.into_owned(),
            });
        }
        log::debug!("loaded {} ({} codes) from {}", dict.name, dict.len(), path.display());
        return Ok(dict);
    }

    builtins::builtin_dictionary(name).ok_or_else(|| DictionaryError::Unknown {
        name: name.to_string(),
        builtins: builtins::BUILTIN_DICTIONARY_NAMES.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_json_rejects_codes_wider_than_grid() {
        let err = Dictionary::from_json_str(
            r#"{"name": "TINY", "marker_size": 2, "codes": [3, 16]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DictionaryError::CodeOutOfRange { index: 1, bits: 4, .. }
        ));
    }

    #[test]
    fn table_round_trips_through_disk() {
        let dict = builtins::DICT_4X4_50;
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        let json = serde_json::to_string(&dict.to_table()).expect("json");
        file.write_all(json.as_bytes()).expect("write");

        let loaded = resolve_dictionary("DICT_4X4_50", Some(file.path())).expect("load");
        assert_eq!(loaded, dict);
    }

    #[test]
    fn unknown_name_mentions_file_flag() {
        let err = resolve_dictionary("DICT_8X8_16", None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("DICT_8X8_16"));
        assert!(msg.contains("--dictionary-file"));
        assert!(msg.contains("DICT_4X4_50"));
    }

    #[test]
    fn file_name_must_match_request() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        file.write_all(br#"{"name": "DICT_5X5_1000", "marker_size": 5, "codes": [1]}"#)
            .expect("write");
        let err = resolve_dictionary("DICT_6X6_250", Some(file.path())).unwrap_err();
        assert!(matches!(err, DictionaryError::NameMismatch { .. }));
    }
}
