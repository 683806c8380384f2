//! Game text codec: 16-bit character codes mapped through a charmap table.

use std::collections::BTreeMap;

use crate::reader::{read_u16, write_u16};

/// Code that ends a string and pads the rest of its field.
pub const TERMINATOR: u16 = 0xFFFF;

/// Bidirectional code ↔ character table.
///
/// Decoding is exact. Encoding uses the first code listed for a character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharTable {
    decode: BTreeMap<u16, char>,
    encode: BTreeMap<char, u16>,
}

impl CharTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `charmap.txt` body of `HEX=char` lines.
    ///
    /// `//` comments are stripped. Control sequences such as `{COLOR}` or
    /// `\n` and any other value that is not exactly one character are ignored.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            let line = match line.find("//") {
                Some(idx) => &line[..idx],
                None => line,
            };
            let line = line
                .trim_start_matches([' ', '\t'])
                .trim_end_matches(['\r', '\n']);
            let Some((code, value)) = line.split_once('=') else {
                continue;
            };
            let Ok(code) = u16::from_str_radix(code.trim(), 16) else {
                continue;
            };
            let mut chars = value.chars();
            let (Some(ch), None) = (chars.next(), chars.next()) else {
                continue;
            };
            if ch == '\0' {
                continue;
            }
            table.insert(code, ch);
        }
        table
    }

    /// Digits, ASCII letters and space at their usual Gen 4 codes.
    pub fn basic_latin() -> Self {
        let mut table = Self::new();
        for (i, ch) in ('0'..='9').enumerate() {
            table.insert(0x0121 + i as u16, ch);
        }
        for (i, ch) in ('A'..='Z').enumerate() {
            table.insert(0x012B + i as u16, ch);
        }
        for (i, ch) in ('a'..='z').enumerate() {
            table.insert(0x0145 + i as u16, ch);
        }
        table.insert(0x01DE, ' ');
        table
    }

    pub fn insert(&mut self, code: u16, ch: char) {
        self.decode.insert(code, ch);
        self.encode.entry(ch).or_insert(code);
    }

    pub fn len(&self) -> usize {
        self.decode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decode.is_empty()
    }

    pub fn char_for(&self, code: u16) -> Option<char> {
        self.decode.get(&code).copied()
    }

    pub fn code_for(&self, ch: char) -> Option<u16> {
        self.encode.get(&ch).copied()
    }

    /// Decode up to `max_chars` codes starting at `offset`.
    ///
    /// Stops at the terminator, a zero code or the first unmapped code.
    pub fn decode(&self, buf: &[u8], offset: usize, max_chars: usize) -> String {
        let mut out = String::new();
        for i in 0..max_chars {
            let code = read_u16(buf, offset + i * 2);
            if code == TERMINATOR || code == 0 {
                break;
            }
            match self.char_for(code) {
                Some(ch) => out.push(ch),
                None => break,
            }
        }
        out
    }

    /// Encode `text` into a field of `max_chars` codes at `offset`.
    ///
    /// The whole field is first filled with terminators, then at most
    /// `max_chars - 1` codes are written followed by a terminator. Unmapped
    /// characters become code 0.
    pub fn encode(&self, text: &str, buf: &mut [u8], offset: usize, max_chars: usize) {
        for i in 0..max_chars {
            write_u16(buf, offset + i * 2, TERMINATOR);
        }

        let limit = max_chars.saturating_sub(1);
        let mut written = 0;
        for ch in text.chars().take(limit) {
            write_u16(buf, offset + written * 2, self.code_for(ch).unwrap_or(0));
            written += 1;
        }
        if written < max_chars {
            write_u16(buf, offset + written * 2, TERMINATOR);
        }
    }
}
