//! Locale-independent sort keys for text.
//!
//! [`ascii_rank`] transliterates text to ASCII. Raw text fields store it in
//! a fast string column, so the index orders text by plain byte comparison
//! of the transliterated form whatever the input script.
//!
//! [`prefix_rank`] packs the first [`RANK_CHARS`] bytes of that form into a
//! `u64` for places that need a numeric key; it only orders by prefix.

use deunicode::deunicode;

/// Number of leading characters that contribute to a prefix rank.
pub const RANK_CHARS: usize = 9;

const BASE: u64 = 129;

/// Sort key of a text value: its ASCII transliteration.
pub fn ascii_rank(text: &str) -> String {
    deunicode(text)
}

/// Numeric rank of the first [`RANK_CHARS`] transliterated bytes. Strings
/// sharing that prefix rank equal.
pub fn prefix_rank(text: &str) -> u64 {
    pack(ascii_rank(text).as_bytes())
}

/// One base-129 digit per byte, 0 marking end of text.
fn pack(bytes: &[u8]) -> u64 {
    let mut bytes = bytes.iter();
    let mut rank = 0u64;
    for _ in 0..RANK_CHARS {
        let digit = match bytes.next() {
            Some(b) => u64::from(b & 0x7f) + 1,
            None => 0,
        };
        rank = rank * BASE + digit;
    }
    rank
}
