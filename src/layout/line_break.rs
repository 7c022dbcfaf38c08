//! Line wrapping

use crate::content::{restore_spaces, SemanticUnit};
use crate::font::FontFace;
use crate::layout::token::{join_tokens, tokenize, Measure, Token};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::Range;

/// Words that read badly at the end of a line
pub const DEFAULT_CONNECTORS: &[&str] = &[
    "a", "an", "and", "but", "for", "nor", "of", "or", "so", "the", "then", "thus", "to", "yet",
    "also", "in", "with",
];

/// How units are laid out into display lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Every unit starts a new display line
    Stanza,
    /// Units run together as one paragraph
    Prose,
}

/// Line-quality rules applied after greedy wrapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapRules {
    /// A lone last word this short (in characters) is an orphan
    pub orphan_max_chars: usize,
    /// The line before an orphan must keep this many words to give one up
    pub orphan_min_prev_words: usize,
    /// Lower-case connector words
    pub connectors: Vec<String>,
}

impl Default for WrapRules {
    fn default() -> Self {
        Self {
            orphan_max_chars: 4,
            orphan_min_prev_words: 3,
            connectors: DEFAULT_CONNECTORS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WrapRules {
    /// Whether `word` is a connector, ignoring case and surrounding punctuation
    pub fn is_connector(&self, word: &str) -> bool {
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
        !bare.is_empty() && self.connectors.iter().any(|c| c.eq_ignore_ascii_case(bare))
    }
}

/// A wrapped line of one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayLine {
    pub text: String,
    /// First display line of its unit
    pub starts_unit: bool,
    /// Index of the unit the line's first word belongs to
    pub unit: usize,
    /// Renderer adds the inter-unit gap above this line
    pub gap_before: bool,
    #[serde(skip)]
    pub(crate) tokens: Range<usize>,
}

/// Greedy word wrapper with weak-ending and orphan passes
pub struct LineWrapper<'a> {
    measure: Measure<'a>,
    rules: &'a WrapRules,
}

impl<'a> LineWrapper<'a> {
    pub fn new(face: &'a dyn FontFace, rules: &'a WrapRules) -> Self {
        Self {
            measure: Measure::new(face),
            rules,
        }
    }

    pub fn face(&self) -> &'a dyn FontFace {
        self.measure.face()
    }

    pub(crate) fn measure(&self) -> Measure<'a> {
        self.measure
    }

    /// Measured width of display text
    pub fn width(&self, text: &str) -> f32 {
        self.measure.width(text)
    }

    /// Wrap a single unit into lines no wider than `max_width`
    pub fn wrap(&self, unit: &SemanticUnit, max_width: f32) -> Vec<DisplayLine> {
        let tokens = tokenize(std::slice::from_ref(unit), self.measure, max_width);
        self.wrap_tokens(&tokens, 0..tokens.len(), max_width, Flow::Stanza)
    }

    /// Wrap `tokens[span]`; line token ranges are absolute indices into `tokens`
    pub(crate) fn wrap_tokens(
        &self,
        tokens: &[Token],
        span: Range<usize>,
        max_width: f32,
        flow: Flow,
    ) -> Vec<DisplayLine> {
        let mut lines = Vec::new();
        let mut seg_start = span.start;

        for idx in span.clone() {
            let new_segment = flow == Flow::Stanza && tokens[idx].starts_unit && idx > seg_start;
            if new_segment {
                self.wrap_segment(tokens, seg_start..idx, max_width, &mut lines);
                seg_start = idx;
            }
        }
        if seg_start < span.end {
            self.wrap_segment(tokens, seg_start..span.end, max_width, &mut lines);
        }
        lines
    }

    fn wrap_segment(
        &self,
        tokens: &[Token],
        segment: Range<usize>,
        max_width: f32,
        out: &mut Vec<DisplayLine>,
    ) {
        let mut ranges = self.greedy(tokens, segment, max_width);
        self.push_weak_endings(tokens, &mut ranges, max_width);
        self.fix_orphan(tokens, &mut ranges, max_width);

        for range in ranges {
            let first = &tokens[range.start];
            out.push(DisplayLine {
                text: restore_spaces(&join_tokens(&tokens[range.clone()])),
                starts_unit: first.starts_unit,
                unit: first.unit,
                gap_before: false,
                tokens: range,
            });
        }
    }

    fn fits(&self, tokens: &[Token], range: Range<usize>, max_width: f32) -> bool {
        self.measure.width(&join_tokens(&tokens[range])) <= max_width
    }

    /// Accumulate words while the joined line fits
    fn greedy(
        &self,
        tokens: &[Token],
        segment: Range<usize>,
        max_width: f32,
    ) -> SmallVec<[Range<usize>; 8]> {
        let mut ranges = SmallVec::new();
        let mut current = segment.start..segment.start;

        for idx in segment {
            if current.is_empty() {
                current = idx..idx + 1;
            } else if self.fits(tokens, current.start..idx + 1, max_width) {
                current.end = idx + 1;
            } else {
                ranges.push(current);
                current = idx..idx + 1;
            }
        }
        if !current.is_empty() {
            ranges.push(current);
        }
        ranges
    }

    /// Move trailing connectors down while the line keeps a word and the next line fits
    fn push_weak_endings(
        &self,
        tokens: &[Token],
        ranges: &mut SmallVec<[Range<usize>; 8]>,
        max_width: f32,
    ) {
        for i in 0..ranges.len().saturating_sub(1) {
            loop {
                let line = ranges[i].clone();
                let next = ranges[i + 1].clone();
                let last = line.end - 1;
                if line.len() < 2
                    || tokens[next.start].glued
                    || !self.rules.is_connector(&tokens[last].text)
                    || !self.fits(tokens, last..next.end, max_width)
                {
                    break;
                }
                ranges[i].end = last;
                ranges[i + 1].start = last;
            }
        }
    }

    /// Pull a word down onto a lone short last line
    fn fix_orphan(
        &self,
        tokens: &[Token],
        ranges: &mut SmallVec<[Range<usize>; 8]>,
        max_width: f32,
    ) {
        let n = ranges.len();
        if n < 2 {
            return;
        }
        let last = ranges[n - 1].clone();
        let prev = ranges[n - 2].clone();
        if last.len() != 1 || tokens[last.start].glued {
            return;
        }
        let orphan = restore_spaces(&tokens[last.start].text);
        if orphan.chars().count() > self.rules.orphan_max_chars
            || prev.len() < self.rules.orphan_min_prev_words.max(2)
        {
            return;
        }

        let moved = prev.end - 1;
        let new_prev = prev.start..moved;
        let new_last = moved..last.end;
        if self.rules.is_connector(&tokens[moved - 1].text) {
            return;
        }
        if self.fits(tokens, new_prev.clone(), max_width)
            && self.fits(tokens, new_last.clone(), max_width)
        {
            ranges[n - 2] = new_prev;
            ranges[n - 1] = new_last;
        }
    }
}
