//! Embedded built-in dictionaries.
//!
//! The source-of-truth lives in `calib-sheets-aruco/data/*_CODES.json`.
//! Codes are stored with black = 1 and match OpenCV's predefined tables
//! bit for bit.

#![allow(clippy::unreadable_literal, non_upper_case_globals)]

include!(concat!(env!("OUT_DIR"), "/builtins.rs"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_to_their_tables() {
        for name in BUILTIN_DICTIONARY_NAMES {
            let dict = builtin_dictionary(name).expect("listed name resolves");
            assert_eq!(dict.name, *name);
        }
        assert!(builtin_dictionary("DICT_8X8_16").is_none());
    }

    #[test]
    fn four_by_four_tables_share_prefix() {
        assert_eq!(DICT_4X4_50.len(), 50);
        assert_eq!(DICT_4X4_100.len(), 100);
        assert_eq!(DICT_4X4_100.codes[..50], DICT_4X4_50.codes[..]);
        assert_eq!(DICT_4X4_1000.codes[..250], DICT_4X4_250.codes[..]);
    }

    #[test]
    fn five_by_five_thousand_is_embedded() {
        let dict = builtin_dictionary("DICT_5X5_1000").expect("5x5");
        assert_eq!((dict.marker_size, dict.max_correction_bits, dict.len()), (5, 2, 1000));
        assert_eq!(dict.code(0), Some(0x18564ba));
        assert_eq!(dict.codes[..250], DICT_5X5_250.codes[..]);
    }
}
