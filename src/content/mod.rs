//! Content model: semantic units and their protected spans

mod clause;

pub use clause::{split_clauses, ClauseSplitter};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Stand-in for whitespace inside a protected span while wrapping.
/// Not whitespace, so word splitting never breaks on it.
pub const WORD_JOINER: char = '\u{2060}';

/// Marker the scripture lookup store puts in place of missing verses
const TEXT_UNAVAILABLE: &str = "text unavailable";

/// Byte range of a unit's text that must never be broken by wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProtectedSpan {
    pub start: usize,
    pub end: usize,
}

impl ProtectedSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// What kind of content is being paginated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Lyric lines: every unit starts its own display line
    #[default]
    Lyrics,
    /// Scripture clauses: units run together as prose
    Scripture,
}

/// Smallest block pagination avoids splitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticUnit {
    text: String,
    spans: Vec<ProtectedSpan>,
}

impl SemanticUnit {
    /// Normalise whitespace and protect `[bracketed]` annotations
    pub fn new(text: &str) -> Self {
        let text = normalize_whitespace(text);
        let spans = bracket_spans(&text);
        Self { text, spans }
    }

    /// Normalise whitespace without detecting any spans
    pub fn plain(text: &str) -> Self {
        Self {
            text: normalize_whitespace(text),
            spans: Vec::new(),
        }
    }

    pub(crate) fn from_parts(text: String, spans: Vec<ProtectedSpan>) -> Self {
        let mut unit = Self { text, spans: Vec::new() };
        for span in spans {
            unit.insert_span(span);
        }
        unit
    }

    /// Protect a byte range of the normalised text
    pub fn protect(mut self, range: Range<usize>) -> Result<Self> {
        let len = self.text.len();
        if range.start >= range.end
            || range.end > len
            || !self.text.is_char_boundary(range.start)
            || !self.text.is_char_boundary(range.end)
        {
            return Err(Error::InvalidSpan {
                start: range.start,
                end: range.end,
                len,
            });
        }
        self.insert_span(ProtectedSpan {
            start: range.start,
            end: range.end,
        });
        Ok(self)
    }

    /// Protect every occurrence of `phrase`
    pub fn protect_phrase(mut self, phrase: &str) -> Self {
        let phrase = normalize_whitespace(phrase);
        if phrase.is_empty() {
            return self;
        }
        let found: Vec<_> = self
            .text
            .match_indices(phrase.as_str())
            .map(|(start, m)| ProtectedSpan {
                start,
                end: start + m.len(),
            })
            .collect();
        for span in found {
            self.insert_span(span);
        }
        self
    }

    /// Keep spans sorted and merge overlaps
    fn insert_span(&mut self, span: ProtectedSpan) {
        self.spans.push(span);
        self.spans.sort();
        let mut merged: Vec<ProtectedSpan> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Text with whitespace inside protected spans replaced by [`WORD_JOINER`]
    pub(crate) fn joined_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + self.spans.len() * 4);
        let mut spans = self.spans.iter().peekable();
        for (idx, c) in self.text.char_indices() {
            while spans.peek().is_some_and(|s| s.end <= idx) {
                spans.next();
            }
            let inside = spans.peek().is_some_and(|s| s.start <= idx && idx < s.end);
            if inside && c == ' ' {
                out.push(WORD_JOINER);
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Whether byte `idx` falls inside a protected span
    pub(crate) fn is_protected(&self, idx: usize) -> bool {
        self.spans.iter().any(|s| s.start <= idx && idx < s.end)
    }
}

/// Restore [`WORD_JOINER`] placeholders to spaces
pub fn restore_spaces(text: &str) -> String {
    text.replace(WORD_JOINER, " ")
}

/// A labelled group of lyric lines paginated on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub label: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(label: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            label: label.into(),
            lines,
        }
    }

    pub fn units(&self) -> Vec<SemanticUnit> {
        lyric_units(&self.lines)
    }
}

/// One unit per non-blank lyric line
pub fn lyric_units<S: AsRef<str>>(lines: &[S]) -> Vec<SemanticUnit> {
    lines
        .iter()
        .map(|line| SemanticUnit::new(line.as_ref()))
        .filter(|unit| !unit.is_blank())
        .collect()
}

/// Clause units for a passage; empty or unavailable text yields none
pub fn scripture_units(text: &str) -> Vec<SemanticUnit> {
    if text.trim().is_empty() || text.to_lowercase().contains(TEXT_UNAVAILABLE) {
        return Vec::new();
    }
    split_clauses(text)
}

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte ranges of `[...]` spans, brackets included
fn bracket_spans(text: &str) -> Vec<ProtectedSpan> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        match c {
            '[' if open.is_none() => open = Some(idx),
            ']' => {
                if let Some(start) = open.take() {
                    // Empty brackets protect nothing
                    if idx > start + 1 {
                        spans.push(ProtectedSpan { start, end: idx + 1 });
                    }
                }
            }
            _ => {}
        }
    }
    spans
}
