//! Formatting helpers shared by the diagnostic output.

use crate::constants::{Address, Word, ADDRESS_FMT_LEN, WORD_FMT_LEN};

/// Render a word as two uppercase hex digits
#[must_use]
pub fn hex_word(word: Word) -> String {
    format!("{word:0width$X}", width = WORD_FMT_LEN)
}

/// Render an address as four uppercase hex digits
#[must_use]
pub fn hex_address(address: Address) -> String {
    format!("{address:0width$X}", width = ADDRESS_FMT_LEN)
}

/// Render a sequence of words, space separated
pub fn hex_bytes<I>(words: I) -> String
where
    I: IntoIterator<Item = Word>,
{
    words
        .into_iter()
        .map(hex_word)
        .collect::<Vec<_>>()
        .join(" ")
}
