//! Dictionary lookup for observed marker codes.

use std::collections::HashMap;

use crate::Dictionary;

/// A dictionary hit for an observed code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: u32,
    /// Clockwise quarter turns `0..=3` with `observed == rotate_code(code(id), rotation)`.
    pub rotation: u8,
    /// Bits that differ after rotation.
    pub hamming: u8,
}

/// Looks up observed codes in a dictionary, in any of the four orientations.
///
/// Exact hits go through a hash index, which is all a cleanly rendered sheet
/// needs. With `max_hamming > 0`, misses fall back to a linear scan for the
/// closest orientation.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    /// `orientations[id * 4 + r]`: code of `id` after `r` clockwise quarter turns.
    orientations: Vec<u64>,
    /// Exact code -> first slot in `orientations` holding it.
    exact: HashMap<u64, usize>,
}

impl Matcher {
    pub fn new(dict: Dictionary, max_hamming: u8) -> Self {
        let n = dict.marker_size;
        let mut orientations = Vec::with_capacity(dict.len() * 4);
        for &code in dict.codes.iter() {
            let mut turned = code;
            for _ in 0..4 {
                orientations.push(turned);
                turned = rotate_cw(turned, n);
            }
        }

        let mut exact = HashMap::with_capacity(orientations.len());
        for (slot, &code) in orientations.iter().enumerate() {
            exact.entry(code).or_insert(slot);
        }

        Self {
            dict,
            max_hamming,
            orientations,
            exact,
        }
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Closest id and orientation within `max_hamming`; ties go to the lower id.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        if let Some(&slot) = self.exact.get(&observed) {
            return Some(slot_match(slot, 0));
        }
        if self.max_hamming == 0 {
            return None;
        }

        self.orientations
            .iter()
            .enumerate()
            .map(|(slot, &code)| (slot, (observed ^ code).count_ones()))
            .filter(|&(_, dist)| dist <= u32::from(self.max_hamming))
            .min_by_key(|&(slot, dist)| (dist, slot))
            .map(|(slot, dist)| slot_match(slot, dist as u8))
    }
}

#[inline]
fn slot_match(slot: usize, hamming: u8) -> Match {
    Match {
        id: (slot / 4) as u32,
        rotation: (slot % 4) as u8,
        hamming,
    }
}

/// Rotate a row-major `n × n` code (`idx = y * n + x`) by `quarter_turns`
/// clockwise.
pub fn rotate_code(code: u64, n: usize, quarter_turns: u8) -> u64 {
    (0..quarter_turns & 3).fold(code, |turned, _| rotate_cw(turned, n))
}

fn rotate_cw(code: u64, n: usize) -> u64 {
    let mut out = 0u64;
    for y in 0..n {
        for x in 0..n {
            // Cell (x, y) takes the bit from (y, n - 1 - x).
            let bit = (code >> ((n - 1 - x) * n + y)) & 1;
            out |= bit << (y * n + x);
        }
    }
    out
}
