//! Standard Helvetica font support
//!
//! Generated PDFs use the non-embedded standard Helvetica font with
//! WinAnsiEncoding, so text is encoded one byte per character. Characters
//! outside WinAnsi are replaced with `?`.

use lopdf::{dictionary, Dictionary};

/// Resource name the font is registered under on every page we draw on
pub const FONT_RESOURCE: &str = "DfHelv";

/// Advance widths of ASCII 32..=126 in 1/1000 em (Helvetica AFM)
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {..~
];

const DEFAULT_WIDTH: u16 = 556;

/// WinAnsi code points 0x80..=0x9F that differ from Latin-1
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '€'),
    (0x82, '‚'),
    (0x83, 'ƒ'),
    (0x84, '„'),
    (0x85, '…'),
    (0x86, '†'),
    (0x87, '‡'),
    (0x88, 'ˆ'),
    (0x89, '‰'),
    (0x8A, 'Š'),
    (0x8B, '‹'),
    (0x8C, 'Œ'),
    (0x8E, 'Ž'),
    (0x91, '‘'),
    (0x92, '’'),
    (0x93, '“'),
    (0x94, '”'),
    (0x95, '•'),
    (0x96, '–'),
    (0x97, '—'),
    (0x98, '˜'),
    (0x99, '™'),
    (0x9A, 'š'),
    (0x9B, '›'),
    (0x9C, 'œ'),
    (0x9E, 'ž'),
    (0x9F, 'Ÿ'),
];

/// Font dictionary for the standard Helvetica font
pub fn font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Width of `text` in points at `font_size`
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * font_size / 1000.0
}

fn char_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => ASCII_WIDTHS[(code - 32) as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// Encode text as WinAnsi bytes
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

fn encode_char(c: char) -> u8 {
    if let Some((byte, _)) = WIN_ANSI_HIGH.iter().find(|(_, ch)| *ch == c) {
        return *byte;
    }
    match c as u32 {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
        0x09 => b' ',
        _ => b'?',
    }
}

/// Decode a PDF string operand
///
/// Strings starting with a UTF-16BE byte order mark are decoded as such;
/// everything else is treated as WinAnsi.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

fn decode_byte(byte: u8) -> char {
    if let Some((_, ch)) = WIN_ANSI_HIGH.iter().find(|(b, _)| *b == byte) {
        return *ch;
    }
    char::from(byte)
}
