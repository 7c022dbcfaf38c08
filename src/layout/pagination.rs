//! Pages and the vertical packer

use crate::content::SemanticUnit;
use crate::geometry::FitSpec;
use crate::layout::line_break::{DisplayLine, Flow, LineWrapper};
use crate::layout::token::{tokenize, unit_ranges, Token};
use serde::Serialize;
use std::ops::Range;

/// Slack for float noise in the height budget check
const HEIGHT_EPSILON: f32 = 1e-3;

/// One slide's worth of display lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub lines: Vec<DisplayLine>,
    /// Units with at least one word on this page
    pub units: Range<usize>,
    #[serde(skip)]
    pub(crate) span: Range<usize>,
}

impl Page {
    /// Mark gap lines and record which tokens and units the lines cover
    pub(crate) fn assemble(mut lines: Vec<DisplayLine>, tokens: &[Token], flow: Flow) -> Self {
        for (i, line) in lines.iter_mut().enumerate() {
            line.gap_before = flow == Flow::Stanza && i > 0 && line.starts_unit;
        }
        let span = match (lines.first(), lines.last()) {
            (Some(first), Some(last)) => first.tokens.start..last.tokens.end,
            _ => 0..0,
        };
        let units = if span.is_empty() {
            0..0
        } else {
            tokens[span.start].unit..tokens[span.end - 1].unit + 1
        };
        Self { lines, units, span }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Lines preceded by an inter-unit gap
    pub fn gap_count(&self) -> usize {
        self.lines.iter().filter(|l| l.gap_before).count()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Height from line and gap counts
    pub fn used_height(&self, fit: &FitSpec) -> f32 {
        self.line_count() as f32 * fit.line_height + self.gap_count() as f32 * fit.unit_gap
    }

    pub fn fits(&self, fit: &FitSpec) -> bool {
        self.used_height(fit) <= fit.max_page_height() + HEIGHT_EPSILON
    }

    /// Lines joined by newlines, as a renderer would place them
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Characters on the page, counting one per line break
    pub fn char_count(&self) -> usize {
        let chars: usize = self.lines.iter().map(|l| l.text.chars().count()).sum();
        chars + self.lines.len().saturating_sub(1)
    }

    /// Number of words across all lines
    pub fn word_count(&self) -> usize {
        self.span.len()
    }
}

/// Fills pages in unit order without splitting a unit that fits a page
pub struct Packer<'a> {
    wrapper: &'a LineWrapper<'a>,
    fit: &'a FitSpec,
    flow: Flow,
}

impl<'a> Packer<'a> {
    pub fn new(wrapper: &'a LineWrapper<'a>, fit: &'a FitSpec, flow: Flow) -> Self {
        Self { wrapper, fit, flow }
    }

    pub fn fit(&self) -> &'a FitSpec {
        self.fit
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub(crate) fn wrapper(&self) -> &'a LineWrapper<'a> {
        self.wrapper
    }

    /// Pack units into pages
    pub fn pack(&self, units: &[SemanticUnit]) -> Vec<Page> {
        let tokens = tokenize(units, self.wrapper.measure(), self.fit.max_line_width());
        self.pack_tokens(&tokens)
    }

    /// Wrap a token span into a page
    pub(crate) fn build(&self, tokens: &[Token], span: Range<usize>) -> Page {
        let lines = self
            .wrapper
            .wrap_tokens(tokens, span, self.fit.max_line_width(), self.flow);
        Page::assemble(lines, tokens, self.flow)
    }

    pub(crate) fn pack_tokens(&self, tokens: &[Token]) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut open: Option<Page> = None;

        for unit in unit_ranges(tokens) {
            let unit_idx = tokens[unit.start].unit;

            if let Some(start) = open.as_ref().map(|page| page.span.start) {
                let candidate = self.build(tokens, start..unit.end);
                if candidate.fits(self.fit) {
                    log::trace!("unit {} joins page {}", unit_idx, pages.len());
                    open = Some(candidate);
                    continue;
                }
                log::trace!("unit {} does not fit page {}, closing it", unit_idx, pages.len());
                pages.extend(open.take());
            }

            let alone = self.build(tokens, unit);
            if alone.fits(self.fit) {
                open = Some(alone);
            } else {
                self.split_unit(alone, tokens, &mut pages);
            }
        }

        pages.extend(open);
        pages
    }

    /// Spread an over-tall unit across fresh pages at line boundaries
    fn split_unit(&self, page: Page, tokens: &[Token], pages: &mut Vec<Page>) {
        let capacity = self.fit.line_capacity();
        log::debug!(
            "unit {} needs {} lines, splitting into pages of {}",
            page.units.start,
            page.line_count(),
            capacity
        );

        for chunk in page.lines.chunks(capacity) {
            let chunk = Page::assemble(chunk.to_vec(), tokens, self.flow);
            if !chunk.fits(self.fit) {
                log::warn!(
                    "line height {} exceeds page budget {}, page {} overflows",
                    self.fit.line_height,
                    self.fit.max_page_height(),
                    pages.len()
                );
            }
            pages.push(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::HeuristicFace;
    use crate::layout::line_break::WrapRules;
    use crate::layout::test_fit;
    use pretty_assertions::assert_eq;

    fn page_texts(pages: &[Page]) -> Vec<Vec<&str>> {
        pages
            .iter()
            .map(|p| p.lines.iter().map(|l| l.text.as_str()).collect())
            .collect()
    }

    fn units(texts: &[&str]) -> Vec<SemanticUnit> {
        texts.iter().map(|t| SemanticUnit::new(t)).collect()
    }

    #[test]
    fn test_units_fill_pages_in_order() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(20.0, 40.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        let pages = packer.pack(&units(&["one", "two", "three", "four", "five"]));
        assert_eq!(
            page_texts(&pages),
            vec![vec!["one", "two", "three", "four"], vec!["five"]]
        );
        assert_eq!(pages[0].units, 0..4);
        assert_eq!(pages[1].unit_count(), 1);
    }

    #[test]
    fn test_gaps_count_against_budget() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(20.0, 40.0, 10.0, 5.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        let pages = packer.pack(&units(&["one", "two", "three", "four"]));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].line_count(), 3);
        assert_eq!(pages[0].gap_count(), 2);
        assert_eq!(pages[0].used_height(&fit), 40.0);
        assert!(!pages[1].lines[0].gap_before);
    }

    #[test]
    fn test_unit_is_never_split_when_it_fits() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(10.0, 20.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        // Second unit wraps to two lines and only fits on a fresh page
        let pages = packer.pack(&units(&["Holy holy", "Lord God Almighty", "Amen"]));
        assert_eq!(
            page_texts(&pages),
            vec![vec!["Holy holy"], vec!["Lord God", "Almighty"], vec!["Amen"]]
        );
    }

    #[test]
    fn test_over_tall_unit_split_at_line_boundaries() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(5.0, 20.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        let pages = packer.pack(&units(&["aa bb cc dd ee", "ff"]));
        assert_eq!(
            page_texts(&pages),
            vec![vec!["aa bb", "cc dd"], vec!["ee"], vec!["ff"]]
        );
        assert!(pages[0].lines[0].starts_unit);
        assert!(!pages[1].lines[0].starts_unit);
        assert!(pages.iter().all(|p| p.fits(&fit)));
    }

    #[test]
    fn test_line_taller_than_page_overflows_alone() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(20.0, 5.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        let pages = packer.pack(&units(&["one", "two"]));
        assert_eq!(pages.len(), 2);
        assert!(!pages[0].fits(&fit));
    }

    #[test]
    fn test_prose_flow_runs_units_together() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(30.0, 20.0, 10.0, 5.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Prose);

        let pages = packer.pack(&units(&["Jesus wept.", "Then said the Jews,", "Behold how he loved him!"]));
        assert_eq!(
            page_texts(&pages),
            vec![
                vec!["Jesus wept. Then said", "the Jews,"],
                vec!["Behold how he loved him!"]
            ]
        );
        assert_eq!(pages[0].gap_count(), 0);
        assert_eq!(pages[0].units, 0..2);
    }

    #[test]
    fn test_empty_input_has_no_pages() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(20.0, 40.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);
        assert!(packer.pack(&[]).is_empty());
    }

    #[test]
    fn test_page_text_and_counts() {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let rules = WrapRules::default();
        let wrapper = LineWrapper::new(&face, &rules);
        let fit = test_fit(20.0, 40.0, 10.0, 0.0);
        let packer = Packer::new(&wrapper, &fit, Flow::Stanza);

        let pages = packer.pack(&units(&["It is well", "with my soul"]));
        assert_eq!(pages[0].text(), "It is well\nwith my soul");
        assert_eq!(pages[0].char_count(), 23);
        assert_eq!(pages[0].word_count(), 6);
    }
}
