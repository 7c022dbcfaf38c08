//! Quality audit of paginated output
//!
//! Flags pages a reviewer would likely want to look at: near-empty slides,
//! short leftovers, slides opening mid-sentence on a connector, overfull
//! slides and the rare page that overflows its budget.

use crate::geometry::FitSpec;
use crate::layout::{Page, DEFAULT_CONNECTORS};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Something worth a second look on one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFlag {
    /// Very little text
    Sparse,
    /// Short one- or two-line leftover
    Tail,
    /// Opens on a connector while the previous page ended mid-sentence
    OrphanStart,
    /// Too much text to read comfortably
    Crowded,
    /// Taller than the budget (only after a forced split)
    Overflow,
}

/// Audit thresholds, in characters and lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditRules {
    pub sparse_max_chars: usize,
    pub tail_max_chars: usize,
    pub tail_max_lines: usize,
    pub orphan_max_chars: usize,
    pub orphan_max_lines: usize,
    pub crowded_min_chars: usize,
    pub crowded_min_lines: usize,
    /// Fonts below this size read as shrunk text
    pub small_font_pt: f32,
}

impl Default for AuditRules {
    fn default() -> Self {
        Self {
            sparse_max_chars: 45,
            tail_max_chars: 120,
            tail_max_lines: 2,
            orphan_max_chars: 220,
            orphan_max_lines: 3,
            crowded_min_chars: 360,
            crowded_min_lines: 8,
            small_font_pt: 26.0,
        }
    }
}

/// Statistics and flags for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAudit {
    pub index: usize,
    pub lines: usize,
    pub chars: usize,
    pub used_height: f32,
    pub flags: SmallVec<[PageFlag; 2]>,
}

/// Audit of a whole page sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub pages: Vec<PageAudit>,
    /// Font size is below the readable threshold
    pub small_font: bool,
}

impl AuditReport {
    /// Indices of pages carrying `flag`
    pub fn flagged(&self, flag: PageFlag) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| p.flags.contains(&flag))
            .map(|p| p.index)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        !self.small_font && self.pages.iter().all(|p| p.flags.is_empty())
    }
}

/// Audit with default thresholds
pub fn audit(pages: &[Page], fit: &FitSpec) -> AuditReport {
    audit_with(pages, fit, &AuditRules::default())
}

pub fn audit_with(pages: &[Page], fit: &FitSpec, rules: &AuditRules) -> AuditReport {
    let mut audits = Vec::with_capacity(pages.len());
    let mut prev_ends_sentence = true;

    for (index, page) in pages.iter().enumerate() {
        let lines = page.line_count();
        let chars = page.char_count();
        let mut flags = SmallVec::new();

        if chars > rules.crowded_min_chars || lines > rules.crowded_min_lines {
            flags.push(PageFlag::Crowded);
        }
        if (chars > 0 && chars < rules.sparse_max_chars) || lines < 2 {
            flags.push(PageFlag::Sparse);
        }
        if chars < rules.tail_max_chars && (1..=rules.tail_max_lines).contains(&lines) {
            flags.push(PageFlag::Tail);
        }
        if index > 0
            && chars < rules.orphan_max_chars
            && (1..=rules.orphan_max_lines).contains(&lines)
            && opens_on_connector(page)
            && !prev_ends_sentence
        {
            flags.push(PageFlag::OrphanStart);
        }
        if !page.fits(fit) {
            flags.push(PageFlag::Overflow);
        }

        prev_ends_sentence = ends_sentence(page);
        audits.push(PageAudit {
            index,
            lines,
            chars,
            used_height: page.used_height(fit),
            flags,
        });
    }

    let report = AuditReport {
        pages: audits,
        small_font: fit.font.size_pt < rules.small_font_pt,
    };
    log::debug!(
        "audit: {} sparse, {} tail, {} orphan starts, {} crowded, {} overflowing",
        report.flagged(PageFlag::Sparse).len(),
        report.flagged(PageFlag::Tail).len(),
        report.flagged(PageFlag::OrphanStart).len(),
        report.flagged(PageFlag::Crowded).len(),
        report.flagged(PageFlag::Overflow).len()
    );
    report
}

fn opens_on_connector(page: &Page) -> bool {
    let Some(first) = page.lines.first().and_then(|l| l.text.split_whitespace().next()) else {
        return false;
    };
    let word = first.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
    DEFAULT_CONNECTORS.contains(&word.as_str())
}

fn ends_sentence(page: &Page) -> bool {
    page.lines
        .last()
        .and_then(|l| l.text.trim_end().chars().last())
        .is_some_and(|c| matches!(c, '.' | ';' | ':' | '!' | '?'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SemanticUnit;
    use crate::font::HeuristicFace;
    use crate::layout::{paginate_with, PaginationConfig};
    use crate::layout::test_fit;

    fn pages_for(texts: &[&str], width: f32, height: f32) -> (Vec<Page>, FitSpec) {
        let face = HeuristicFace::monospace(1.0, 1.0);
        let fit = test_fit(width, height, 10.0, 0.0);
        let units: Vec<_> = texts.iter().map(|t| SemanticUnit::new(t)).collect();
        let config = PaginationConfig {
            rebalance: crate::layout::RebalanceRules {
                lonely_pages: false,
                ..Default::default()
            },
            ..Default::default()
        };
        (paginate_with(&units, &fit, &face, &config), fit)
    }

    #[test]
    fn test_short_leftover_is_sparse_tail() {
        let (pages, fit) = pages_for(
            &[
                "Be thou my vision O Lord of my heart",
                "Naught be all else to me save that thou art",
                "Amen",
            ],
            60.0,
            20.0,
        );
        let report = audit(&pages, &fit);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.flagged(PageFlag::Sparse), vec![1]);
        assert!(report.flagged(PageFlag::Tail).contains(&1));
        assert!(report.small_font);
    }

    #[test]
    fn test_orphan_start_needs_unfinished_previous_page() {
        let (pages, fit) = pages_for(&["We sing of the love", "and the grace of God"], 40.0, 10.0);
        assert_eq!(audit(&pages, &fit).flagged(PageFlag::OrphanStart), vec![1]);

        let (pages, fit) = pages_for(&["We sing of the love.", "And the grace of God"], 40.0, 10.0);
        assert!(audit(&pages, &fit).flagged(PageFlag::OrphanStart).is_empty());
    }

    #[test]
    fn test_crowded_page() {
        let lines: Vec<String> = (0..9).map(|i| format!("line {}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (pages, fit) = pages_for(&refs, 40.0, 100.0);
        let report = audit(&pages, &fit);
        assert_eq!(report.flagged(PageFlag::Crowded), vec![0]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_overflow_flagged() {
        let (pages, fit) = pages_for(&["too tall"], 40.0, 5.0);
        assert_eq!(audit(&pages, &fit).flagged(PageFlag::Overflow), vec![0]);
    }

    #[test]
    fn test_report_serializes() {
        let (pages, fit) = pages_for(&["Holy holy holy"], 40.0, 20.0);
        let json = serde_json::to_string(&audit(&pages, &fit)).unwrap();
        assert!(json.contains("\"sparse\""));
    }
}
