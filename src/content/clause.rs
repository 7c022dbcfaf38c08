//! Punctuation-bounded clause splitting for scripture text

use super::{ProtectedSpan, SemanticUnit};
use serde::{Deserialize, Serialize};

/// Splits running text into clause-sized units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClauseSplitter {
    /// A trailing clause with at most this many words joins the previous one
    pub merge_max_words: usize,
    /// A trailing clause with at most this many letters/digits joins the previous one
    pub merge_max_chars: usize,
}

impl Default for ClauseSplitter {
    fn default() -> Self {
        Self {
            merge_max_words: 2,
            merge_max_chars: 8,
        }
    }
}

impl ClauseSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `text` at `. ! ?` and `; :` before whitespace or the end, and at `,` before whitespace
    pub fn split(&self, text: &str) -> Vec<SemanticUnit> {
        let whole = SemanticUnit::new(text);
        if whole.is_blank() {
            return Vec::new();
        }

        let source = whole.text();
        let mut clauses: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;
        let mut chars = source.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            let next = chars.peek().map(|&(_, n)| n);
            let at_boundary = match c {
                '.' | '!' | '?' | ';' | ':' => next.map_or(true, char::is_whitespace),
                ',' => next.is_some_and(char::is_whitespace),
                _ => false,
            };
            if at_boundary && !whole.is_protected(idx) {
                let end = idx + c.len_utf8();
                push_clause(source, start, end, &mut clauses);
                start = end;
            }
        }
        push_clause(source, start, source.len(), &mut clauses);

        if clauses.len() >= 2 {
            let (last_start, last_end) = clauses[clauses.len() - 1];
            if self.is_fragment(&source[last_start..last_end]) {
                clauses.pop();
                if let Some(prev) = clauses.last_mut() {
                    prev.1 = last_end;
                }
            }
        }

        clauses
            .into_iter()
            .map(|(start, end)| {
                let spans = whole
                    .spans()
                    .iter()
                    .filter(|s| s.start >= start && s.end <= end)
                    .map(|s| ProtectedSpan {
                        start: s.start - start,
                        end: s.end - start,
                    })
                    .collect();
                SemanticUnit::from_parts(source[start..end].to_string(), spans)
            })
            .collect()
    }

    /// Too short to stand alone ("Amen.")
    fn is_fragment(&self, clause: &str) -> bool {
        let words = clause.split_whitespace().count();
        let compact = clause.chars().filter(|c| c.is_alphanumeric()).count();
        words <= self.merge_max_words || compact <= self.merge_max_chars
    }
}

/// Record the trimmed byte range of a clause, skipping empty ones
fn push_clause(source: &str, start: usize, end: usize, clauses: &mut Vec<(usize, usize)>) {
    let slice = &source[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    if start + lead < end - trail {
        clauses.push((start + lead, end - trail));
    }
}

/// Split with the default merge thresholds
pub fn split_clauses(text: &str) -> Vec<SemanticUnit> {
    ClauseSplitter::default().split(text)
}
