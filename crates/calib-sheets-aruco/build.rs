//! Generates `builtins.rs` from `data/*_CODES.json`.

use serde::Deserialize;
use std::fmt::Write as _;
use std::{env, fs, path::Path};

#[derive(Deserialize)]
struct CodeTable {
    name: String,
    marker_size: usize,
    max_correction_bits: u8,
    codes: Vec<u64>,
}

fn main() {
    let data_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    println!("cargo:rerun-if-changed={}", data_dir.display());

    let mut paths: Vec<_> = fs::read_dir(&data_dir)
        .expect("read data dir")
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with("_CODES.json"))
        })
        .collect();
    paths.sort();

    let mut tables = Vec::with_capacity(paths.len());
    for path in &paths {
        println!("cargo:rerun-if-changed={}", path.display());
        let raw = fs::read_to_string(path).expect("read code table");
        let table: CodeTable = serde_json::from_str(&raw).expect("parse code table");
        let bits = table.marker_size * table.marker_size;
        assert!(bits <= 64, "{}: {} bits do not fit into u64", table.name, bits);
        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        for &code in &table.codes {
            assert!(code & !mask == 0, "{}: code {code:#x} exceeds {bits} bits", table.name);
        }
        tables.push(table);
    }

    let mut out = String::new();
    for t in &tables {
        writeln!(out, "/// `{}`: {} markers of {}x{} bits.", t.name, t.codes.len(), t.marker_size, t.marker_size).unwrap();
        writeln!(out, "pub const {}: crate::Dictionary = crate::Dictionary {{", t.name).unwrap();
        writeln!(out, "    name: ::std::borrow::Cow::Borrowed(\"{}\"),", t.name).unwrap();
        writeln!(out, "    marker_size: {},", t.marker_size).unwrap();
        writeln!(out, "    max_correction_bits: {},", t.max_correction_bits).unwrap();
        write!(out, "    codes: ::std::borrow::Cow::Borrowed(&[").unwrap();
        for (i, code) in t.codes.iter().enumerate() {
            if i % 8 == 0 {
                out.push_str("\n        ");
            }
            write!(out, "0x{code:016x}, ").unwrap();
        }
        out.push_str("\n    ]),\n};\n\n");
    }

    out.push_str("/// Names of every embedded dictionary, sorted.\n");
    out.push_str("pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &[");
    for t in &tables {
        write!(out, "\"{}\", ", t.name).unwrap();
    }
    out.push_str("];\n\n");

    out.push_str("/// Look up an embedded dictionary by its OpenCV-style name.\n");
    out.push_str("pub fn builtin_dictionary(name: &str) -> Option<crate::Dictionary> {\n");
    out.push_str("    match name {\n");
    for t in &tables {
        writeln!(out, "        \"{0}\" => Some({0}),", t.name).unwrap();
    }
    out.push_str("        _ => None,\n    }\n}\n");

    let dest = Path::new(&env::var("OUT_DIR").expect("OUT_DIR")).join("builtins.rs");
    fs::write(dest, out).expect("write builtins.rs");
}
