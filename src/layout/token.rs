//! Word tokens shared by the wrapper, packer and rebalancer
//!
//! Every page is a contiguous run of tokens, so any page can be rebuilt by
//! re-wrapping its token span. Words wider than a line are split into glued
//! pieces up front; the token list is then fixed for one pagination run.

use crate::content::{restore_spaces, SemanticUnit, WORD_JOINER};
use crate::font::{checked_width, FontFace};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// One word (or piece of an oversized word)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Word text; spaces inside protected spans are [`WORD_JOINER`]
    pub text: String,
    /// Index of the originating unit
    pub unit: usize,
    /// First token of its unit
    pub starts_unit: bool,
    /// Continues the previous token without a space
    pub glued: bool,
}

/// Width measurement with protected-span placeholders restored
#[derive(Clone, Copy)]
pub(crate) struct Measure<'a> {
    face: &'a dyn FontFace,
}

impl<'a> Measure<'a> {
    pub fn new(face: &'a dyn FontFace) -> Self {
        Self { face }
    }

    pub fn width(&self, text: &str) -> f32 {
        if text.contains(WORD_JOINER) {
            checked_width(self.face, &restore_spaces(text))
        } else {
            checked_width(self.face, text)
        }
    }

    pub fn face(&self) -> &'a dyn FontFace {
        self.face
    }
}

/// Render a token run as display text
pub(crate) fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && !token.glued {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
    out
}

/// Tokenize units in order, pre-splitting words wider than `max_width`
pub(crate) fn tokenize(units: &[SemanticUnit], measure: Measure<'_>, max_width: f32) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (unit_idx, unit) in units.iter().enumerate() {
        let joined = unit.joined_text();
        let mut first = true;
        for word in joined.split_whitespace() {
            for (text, glued) in fit_word(word, measure, max_width) {
                tokens.push(Token {
                    text,
                    unit: unit_idx,
                    starts_unit: first,
                    glued,
                });
                first = false;
            }
        }
    }
    tokens
}

/// Pieces of `word` that each fit `max_width`, with their glue flags
fn fit_word(word: &str, measure: Measure<'_>, max_width: f32) -> Vec<(String, bool)> {
    if measure.width(word) <= max_width {
        return vec![(word.to_string(), false)];
    }

    if word.contains(WORD_JOINER) {
        log::warn!(
            "protected span {:?} is wider than a line, breaking it at its spaces",
            restore_spaces(word)
        );
        return word
            .split(WORD_JOINER)
            .filter(|part| !part.is_empty())
            .flat_map(|part| fit_word(part, measure, max_width))
            .collect();
    }

    split_oversized(word, measure, max_width)
        .into_iter()
        .enumerate()
        .map(|(i, piece)| (piece, i > 0))
        .collect()
}

/// Hard-split a word: at line-break opportunities first, then by grapheme
fn split_oversized(word: &str, measure: Measure<'_>, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut prev = 0;

    for (pos, _) in unicode_linebreak::linebreaks(word) {
        let segment = &word[prev..pos];
        prev = pos;
        if segment.is_empty() {
            continue;
        }

        if measure.width(&format!("{}{}", current, segment)) <= max_width {
            current.push_str(segment);
            continue;
        }
        if !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        if measure.width(segment) <= max_width {
            current.push_str(segment);
            continue;
        }

        for grapheme in segment.graphemes(true) {
            // A lone grapheme wider than the line still has to go somewhere
            if current.is_empty() || measure.width(&format!("{}{}", current, grapheme)) <= max_width {
                current.push_str(grapheme);
            } else {
                pieces.push(std::mem::take(&mut current));
                current.push_str(grapheme);
            }
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Contiguous token ranges belonging to each unit, in order
pub(crate) fn unit_ranges(tokens: &[Token]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        match ranges.last_mut() {
            Some(range) if tokens[range.start].unit == token.unit => range.end = idx + 1,
            _ => ranges.push(idx..idx + 1),
        }
    }
    ranges
}
