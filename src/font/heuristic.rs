//! Table-driven width estimates, the guaranteed last fallback

use super::{FontFace, LineMetrics};

/// Estimated metrics from per-character widths in em units
#[derive(Debug, Clone)]
pub struct HeuristicFace {
    family: String,
    size_pt: f32,
    /// Width of ASCII characters (0-127), in em
    char_widths: Vec<f32>,
    /// Width for everything outside the table, in em
    default_width: f32,
    /// Width for wide (CJK) characters, in em
    wide_width: f32,
}

impl HeuristicFace {
    /// Class-based widths roughly matching a humanist sans
    pub fn proportional(family: impl Into<String>, size_pt: f32) -> Self {
        let mut char_widths = Vec::with_capacity(128);
        for code in 0u8..128 {
            char_widths.push(ascii_em_width(code as char));
        }

        Self {
            family: family.into(),
            size_pt,
            char_widths,
            default_width: 0.6,
            wide_width: 1.0,
        }
    }

    /// Every character is `em` wide, including spaces
    pub fn monospace(size_pt: f32, em: f32) -> Self {
        Self {
            family: "Monospace".to_string(),
            size_pt,
            char_widths: vec![em; 128],
            default_width: em,
            wide_width: em,
        }
    }

    /// Rename the face
    pub fn named(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Width of a character in em
    pub fn em_width(&self, c: char) -> f32 {
        if c.is_ascii() {
            if c.is_ascii_control() {
                return 0.0;
            }
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        if is_zero_width(c) {
            0.0
        } else if is_wide(c) {
            self.wide_width
        } else {
            self.default_width
        }
    }
}

impl FontFace for HeuristicFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn size_pt(&self) -> f32 {
        self.size_pt
    }

    fn measure(&self, text: &str) -> f32 {
        text.chars().map(|c| self.em_width(c)).sum::<f32>() * self.size_pt
    }

    fn metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: self.size_pt * 0.8,
            descent: self.size_pt * 0.2,
        }
    }
}

fn ascii_em_width(c: char) -> f32 {
    match c {
        ' ' => 0.25,
        'i' | 'j' | 'l' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' | 'I' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' | '"' => 0.36,
        'm' | 'w' => 0.8,
        'M' | 'W' => 0.9,
        '0'..='9' => 0.55,
        'a'..='z' => 0.5,
        'A'..='Z' => 0.65,
        _ if c.is_ascii_control() => 0.0,
        _ => 0.55,
    }
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}')
}

fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F | 0x2E80..=0x303E | 0x3040..=0x30FF | 0x31F0..=0x31FF
            | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF
            | 0xFF00..=0xFF60
    )
}
