//! Post-pack repairs across page boundaries
//!
//! Every repair rebuilds the two affected pages from their token spans and
//! commits only when both rebuilt pages fit. Repairs refuse moves that would
//! hand another repair a new trigger, so a repaired sequence is a fixed point.

use crate::content::{ContentKind, SemanticUnit};
use crate::layout::line_break::Flow;
use crate::layout::pagination::{Packer, Page};
use crate::layout::token::{tokenize, Token};
use serde::{Deserialize, Serialize};

/// Text used to estimate how many characters fit on a line
const SAMPLE_TEXT: &str = "the quick brown fox jumps over the lazy dog";

/// Thresholds and switches for the repair passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceRules {
    /// Move a unit onto pages holding fewer than `min_units_per_page` units
    pub lonely_pages: bool,
    /// Borrow words onto single-line pages and a tiny first page (prose flow only)
    pub head_borrow: bool,
    /// Merge or refill tiny pages, walking back from the end
    pub tail_merge: bool,
    pub min_units_per_page: usize,
    /// A donor page must hold more than this many units
    pub min_retained_units: usize,
    pub max_passes: usize,
    /// Words borrowed per step
    pub borrow_batch: usize,
    /// Stop borrowing when the next page would keep fewer words
    pub min_next_words: usize,
    /// A last line with this many words counts as filled
    pub filled_min_words: usize,
    /// A last line this share of the line width counts as filled
    pub filled_min_ratio: f32,
    pub tiny_max_lines: usize,
    pub tiny_min_chars: usize,
    /// Tiny pages hold fewer than this many lines' worth of characters
    pub tiny_line_factor: f32,
}

impl Default for RebalanceRules {
    fn default() -> Self {
        Self {
            lonely_pages: true,
            head_borrow: false,
            tail_merge: false,
            min_units_per_page: 2,
            min_retained_units: 2,
            max_passes: 3,
            borrow_batch: 2,
            min_next_words: 3,
            filled_min_words: 6,
            filled_min_ratio: 0.55,
            tiny_max_lines: 2,
            tiny_min_chars: 85,
            tiny_line_factor: 2.5,
        }
    }
}

impl RebalanceRules {
    /// Lyrics get lonely-page repair; scripture also borrows heads and fixes tails
    pub fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Lyrics => Self::default(),
            ContentKind::Scripture => Self {
                head_borrow: true,
                tail_merge: true,
                ..Self::default()
            },
        }
    }
}

/// Applies the repair passes to packed pages
pub struct Rebalancer<'a> {
    packer: &'a Packer<'a>,
    rules: &'a RebalanceRules,
    tiny_chars: usize,
}

impl<'a> Rebalancer<'a> {
    pub fn new(packer: &'a Packer<'a>, rules: &'a RebalanceRules) -> Self {
        let wrapper = packer.wrapper();
        let avg_char = wrapper.width(SAMPLE_TEXT) / SAMPLE_TEXT.chars().count() as f32;
        let chars_per_line = if avg_char > 0.0 {
            packer.fit().max_line_width() / avg_char
        } else {
            0.0
        };
        let tiny_chars = rules
            .tiny_min_chars
            .max((rules.tiny_line_factor * chars_per_line).round() as usize);

        Self {
            packer,
            rules,
            tiny_chars,
        }
    }

    /// Rebalance pages the packer produced for the same units
    pub fn rebalance(&self, units: &[SemanticUnit], pages: Vec<Page>) -> Vec<Page> {
        let fit = self.packer.fit();
        let tokens = tokenize(units, self.packer.wrapper().measure(), fit.max_line_width());
        self.rebalance_tokens(&tokens, pages)
    }

    pub(crate) fn rebalance_tokens(&self, tokens: &[Token], mut pages: Vec<Page>) -> Vec<Page> {
        if pages.len() < 2 {
            return pages;
        }
        if pages.iter().any(|p| p.span.is_empty() || p.span.end > tokens.len()) {
            log::warn!("pages do not match the given units, skipping rebalancing");
            return pages;
        }

        let prose = self.packer.flow() == Flow::Prose;
        for pass in 0..self.rules.max_passes {
            let mut changed = false;
            if self.rules.lonely_pages {
                changed |= self.repair_lonely(tokens, &mut pages);
            }
            if self.rules.head_borrow && prose {
                changed |= self.repair_heads(tokens, &mut pages);
            }
            if self.rules.tail_merge {
                changed |= self.repair_tail(tokens, &mut pages);
            }
            if !changed {
                log::trace!("rebalancing settled after {} passes", pass);
                break;
            }
        }
        pages
    }

    /// Last line holds enough words or width
    fn is_filled(&self, page: &Page) -> bool {
        let Some(line) = page.lines.last() else {
            return false;
        };
        let max_width = self.packer.fit().max_line_width();
        line.tokens.len() >= self.rules.filled_min_words
            || self.packer.wrapper().width(&line.text) >= self.rules.filled_min_ratio * max_width
    }

    fn is_tiny(&self, page: &Page) -> bool {
        page.line_count() <= self.rules.tiny_max_lines && page.char_count() < self.tiny_chars
    }

    fn is_lonely(&self, page: &Page, prev: &Page) -> bool {
        page.unit_count() < self.rules.min_units_per_page
            && prev.unit_count() > self.rules.min_retained_units
    }

    /// Page `idx` would start a head borrow
    fn wants_head(&self, idx: usize, page: &Page) -> bool {
        page.line_count() == 1 || (idx == 0 && self.is_tiny(page))
    }

    /// Shrinking donor page `idx` would trigger a head borrow it did not before
    fn invites_head_borrow(&self, idx: usize, before: &Page, after: &Page) -> bool {
        self.rules.head_borrow
            && self.packer.flow() == Flow::Prose
            && self.wants_head(idx, after)
            && !self.wants_head(idx, before)
    }

    /// First token of the last unit run on `page`
    fn last_run_start(&self, tokens: &[Token], page: &Page) -> usize {
        let last = page.span.end - 1;
        let unit = tokens[last].unit;
        let mut start = last;
        while start > page.span.start && tokens[start - 1].unit == unit {
            start -= 1;
        }
        start
    }

    fn repair_lonely(&self, tokens: &[Token], pages: &mut [Page]) -> bool {
        let fit = self.packer.fit();
        let mut changed = false;

        for i in 1..pages.len() {
            if !self.is_lonely(&pages[i], &pages[i - 1]) {
                continue;
            }
            let prev = &pages[i - 1];
            let cut = self.last_run_start(tokens, prev);
            if cut == prev.span.start {
                continue;
            }

            let new_prev = self.packer.build(tokens, prev.span.start..cut);
            let new_cur = self.packer.build(tokens, cut..pages[i].span.end);
            if !new_prev.fits(fit)
                || !new_cur.fits(fit)
                || self.invites_head_borrow(i - 1, prev, &new_prev)
            {
                log::trace!("lonely page {} cannot take unit {}", i, tokens[cut].unit);
                continue;
            }

            log::debug!(
                "moved unit {} from page {} onto lonely page {}",
                tokens[cut].unit,
                i - 1,
                i
            );
            pages[i - 1] = new_prev;
            pages[i] = new_cur;
            changed = true;
        }
        changed
    }

    /// Borrow leading words of the next page onto single-line pages and a tiny first page
    fn repair_heads(&self, tokens: &[Token], pages: &mut [Page]) -> bool {
        let fit = self.packer.fit();
        let mut changed = false;

        for i in 0..pages.len().saturating_sub(1) {
            if !self.wants_head(i, &pages[i]) {
                continue;
            }
            let page_before = pages[i].clone();
            let next_before = pages[i + 1].clone();
            let start = page_before.span.start;
            let end = next_before.span.end;
            let mut cut = next_before.span.start;

            loop {
                let remaining = end - cut;
                if remaining < self.rules.min_next_words.max(2) {
                    break;
                }
                let take = self.rules.borrow_batch.clamp(1, remaining - 1);
                let page = self.packer.build(tokens, start..cut + take);
                let next = self.packer.build(tokens, cut + take..end);
                if !page.fits(fit)
                    || !next.fits(fit)
                    || self.borrow_hurts((&page_before, &next_before), (&page, &next))
                {
                    log::trace!("page {} cannot borrow {} more words", i, take);
                    break;
                }

                cut += take;
                let done = !self.wants_head(i, &page) && self.is_filled(&page);
                pages[i] = page;
                pages[i + 1] = next;
                changed = true;
                if done {
                    break;
                }
            }

            if cut != next_before.span.start {
                log::debug!(
                    "page {} borrowed {} words from page {}",
                    i,
                    cut - next_before.span.start,
                    i + 1
                );
            }
        }
        changed
    }

    /// Whether shrinking the next page would trigger another repair
    fn borrow_hurts(&self, before: (&Page, &Page), after: (&Page, &Page)) -> bool {
        let (page_before, next_before) = before;
        let (page, next) = after;
        if next.line_count() < 2 && next_before.line_count() >= 2 {
            return true;
        }
        if self.rules.lonely_pages
            && self.is_lonely(next, page)
            && !self.is_lonely(next_before, page_before)
        {
            return true;
        }
        self.rules.tail_merge && self.is_tiny(next) && !self.is_tiny(next_before)
    }

    /// Walk back from the last page, merging each tiny page into its
    /// predecessor or refilling it with whole units, until a walk changes nothing
    fn repair_tail(&self, tokens: &[Token], pages: &mut Vec<Page>) -> bool {
        let mut changed = false;
        while self.walk_tail(tokens, pages) {
            changed = true;
        }
        changed
    }

    fn walk_tail(&self, tokens: &[Token], pages: &mut Vec<Page>) -> bool {
        let fit = self.packer.fit();
        let mut changed = false;
        let mut j = pages.len().saturating_sub(1);

        while j > 0 {
            if !self.is_tiny(&pages[j]) {
                j -= 1;
                continue;
            }

            let merged = self
                .packer
                .build(tokens, pages[j - 1].span.start..pages[j].span.end);
            if merged.fits(fit) {
                log::debug!("merged tiny page {} into page {}", j, j - 1);
                pages.remove(j);
                pages[j - 1] = merged;
                changed = true;
                // The merged page may itself be tiny
                j -= 1;
                continue;
            }

            changed |= self.refill(tokens, pages, j);
            j -= 1;
        }
        changed
    }

    /// Move whole unit runs from page `j - 1` until page `j` is not tiny
    fn refill(&self, tokens: &[Token], pages: &mut [Page], j: usize) -> bool {
        let fit = self.packer.fit();
        let mut moved = false;

        while self.is_tiny(&pages[j]) {
            let prev = &pages[j - 1];
            let cut = self.last_run_start(tokens, prev);
            if cut == prev.span.start {
                break;
            }

            let new_prev = self.packer.build(tokens, prev.span.start..cut);
            let new_page = self.packer.build(tokens, cut..pages[j].span.end);
            let starves_prev = self.rules.lonely_pages
                && new_prev.unit_count() < self.rules.min_units_per_page;
            if !new_prev.fits(fit)
                || !new_page.fits(fit)
                || starves_prev
                || self.invites_head_borrow(j - 1, prev, &new_prev)
            {
                log::trace!("refill of page {} stops before unit {}", j, tokens[cut].unit);
                break;
            }

            log::debug!("moved unit {} onto tiny page {}", tokens[cut].unit, j);
            pages[j - 1] = new_prev;
            pages[j] = new_page;
            moved = true;
        }
        moved
    }
}
