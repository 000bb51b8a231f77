//! Character/byte offset translation
//!
//! Entity spans are expressed in characters, while Rust string slicing and
//! regex matches work in bytes. `TextIndex` converts between the two.

use std::ops::Range;

/// Byte position of every character boundary in a text
pub struct TextIndex<'a> {
    text: &'a str,
    /// Byte offset of each char, followed by `text.len()`
    boundaries: Vec<usize>,
}

impl<'a> TextIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { text, boundaries }
    }

    /// Number of characters in the text
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Character offset for a byte offset that lies on a char boundary.
    /// Offsets inside a multi-byte char round up to the next boundary.
    pub fn char_offset(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i,
        }
    }

    /// Byte range for a half-open character range, if it lies within the text
    pub fn byte_range(&self, start: usize, end: usize) -> Option<Range<usize>> {
        if start > end || end > self.char_len() {
            return None;
        }
        Some(self.boundaries[start]..self.boundaries[end])
    }

    /// Substring covered by a half-open character range
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a str> {
        self.byte_range(start, end).map(|range| &self.text[range])
    }
}
