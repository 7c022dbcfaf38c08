//! slide-fit: text fitting and pagination for presentation decks
//!
//! This crate turns ordered content units (lyric lines, scripture clauses)
//! into pages of measured display lines that fit a slide's text container:
//! - Geometry resolution from a declared box, margins and font into a [`FitSpec`]
//! - Width measurement through a ranked font fallback chain
//! - Line wrapping that avoids weak line endings and orphan words
//! - Vertical packing that keeps units whole whenever they fit
//! - Rebalancing of lonely, head-heavy and tiny trailing pages
//!
//! Layout never fails. Missing fonts, bad geometry and oversized units all
//! degrade to documented fallbacks.

pub mod audit;
pub mod content;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use audit::{audit, AuditReport, AuditRules, PageAudit, PageFlag};
pub use content::{
    lyric_units, scripture_units, split_clauses, ClauseSplitter, ContentKind, ProtectedSpan,
    Section, SemanticUnit,
};
pub use error::{Error, Result};
pub use font::{FontChain, FontFace, FontLibrary, FontRequest, FontSource, HeuristicFace, LineMetrics};
pub use geometry::{
    resolve_fit, resolve_fit_with, ContainerGeometry, FitConfig, FitOverrides, FitPreset, FitSpec,
    LineSpacing, Margins,
};
pub use layout::{
    paginate_with, DisplayLine, Flow, LineWrapper, Packer, Page, PaginationConfig, RebalanceRules,
    Rebalancer, WrapRules,
};

use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

/// Pages of one labelled section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionPages {
    pub label: String,
    pub pages: Vec<Page>,
}

/// A container's fit spec and resolved face, ready to paginate content
#[derive(Debug, Clone)]
pub struct Paginator {
    fit: FitSpec,
    face: Arc<dyn FontFace>,
    fell_back: bool,
    config: PaginationConfig,
}

impl Paginator {
    /// Resolve the fit spec's font through `fonts`
    pub fn new(fit: FitSpec, fonts: &FontChain, config: PaginationConfig) -> Self {
        let resolved = fonts.resolve(&fit.font);
        Self {
            fit,
            face: resolved.face,
            fell_back: resolved.fell_back,
            config,
        }
    }

    /// Use an already loaded face
    pub fn with_face(fit: FitSpec, face: Arc<dyn FontFace>, config: PaginationConfig) -> Self {
        Self {
            fit,
            face,
            fell_back: false,
            config,
        }
    }

    /// Resolve a container and its font in one step
    pub fn for_container(
        geometry: &ContainerGeometry,
        fit_config: &FitConfig,
        fonts: &FontChain,
        kind: ContentKind,
    ) -> Self {
        let fit = resolve_fit_with(geometry, fit_config);
        Self::new(fit, fonts, PaginationConfig::for_kind(kind))
    }

    pub fn fit(&self) -> &FitSpec {
        &self.fit
    }

    pub fn face(&self) -> &dyn FontFace {
        self.face.as_ref()
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// True when the requested family was not available
    pub fn font_fell_back(&self) -> bool {
        self.fell_back
    }

    /// Paginate units with the configured flow and repairs
    pub fn paginate(&self, units: &[SemanticUnit]) -> Vec<Page> {
        paginate_with(units, &self.fit, self.face.as_ref(), &self.config)
    }

    /// One unit per non-blank line, stanza flow
    ///
    /// A paginator configured for another kind keeps its wrap rules and
    /// rebalance thresholds; only the repair switches follow the lyric defaults.
    pub fn paginate_lyrics<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Page> {
        let config = self.config_for(ContentKind::Lyrics);
        paginate_with(&lyric_units(lines), &self.fit, self.face.as_ref(), &config)
    }

    /// Clause units of a passage, prose flow
    ///
    /// A paginator configured for another kind keeps its wrap rules and
    /// rebalance thresholds; only the repair switches follow the scripture defaults.
    pub fn paginate_scripture(&self, text: &str) -> Vec<Page> {
        let config = self.config_for(ContentKind::Scripture);
        paginate_with(&scripture_units(text), &self.fit, self.face.as_ref(), &config)
    }

    /// Paginate each section on its own pages, skipping empty sections
    pub fn paginate_sections(&self, sections: &[Section]) -> Vec<SectionPages> {
        sections
            .iter()
            .filter_map(|section| {
                let pages = self.paginate_lyrics(&section.lines);
                if pages.is_empty() {
                    log::debug!("section {:?} has no content", section.label);
                    return None;
                }
                Some(SectionPages {
                    label: section.label.clone(),
                    pages,
                })
            })
            .collect()
    }

    pub fn audit(&self, pages: &[Page]) -> AuditReport {
        audit(pages, &self.fit)
    }

    fn config_for(&self, kind: ContentKind) -> Cow<'_, PaginationConfig> {
        if self.config.kind == kind {
            Cow::Borrowed(&self.config)
        } else {
            let switches = RebalanceRules::for_kind(kind);
            Cow::Owned(PaginationConfig {
                kind,
                wrap: self.config.wrap.clone(),
                rebalance: RebalanceRules {
                    lonely_pages: switches.lonely_pages,
                    head_borrow: switches.head_borrow,
                    tail_merge: switches.tail_merge,
                    ..self.config.rebalance.clone()
                },
            })
        }
    }
}

/// Paginate with the heuristic face and lyric defaults
pub fn paginate(units: &[SemanticUnit], fit: &FitSpec) -> Vec<Page> {
    Paginator::new(fit.clone(), &FontChain::new(), PaginationConfig::default()).paginate(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_fit;
    use pretty_assertions::assert_eq;

    fn mono_paginator(width: f32, height: f32, kind: ContentKind) -> Paginator {
        Paginator::with_face(
            test_fit(width, height, 10.0, 0.0),
            Arc::new(HeuristicFace::monospace(1.0, 1.0)),
            PaginationConfig::for_kind(kind),
        )
    }

    fn line_texts(pages: &[Page]) -> Vec<Vec<String>> {
        pages
            .iter()
            .map(|p| p.lines.iter().map(|l| l.text.clone()).collect())
            .collect()
    }

    #[test]
    fn test_paginate_with_default_chain() {
        let geometry = ContainerGeometry::new(800.0, 400.0).with_font("Gotham", 40.0);
        let fit = resolve_fit(&geometry, FitPreset::Normal);
        let pages = paginate(&lyric_units(&["Amazing grace", "How sweet the sound"]), &fit);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].unit_count(), 2);
        assert!(pages[0].fits(&fit));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let geometry = ContainerGeometry::new(800.0, 400.0).with_font("Gotham", 40.0);
        let paginator = Paginator::for_container(
            &geometry,
            &FitConfig::default(),
            &FontChain::new(),
            ContentKind::Lyrics,
        );
        assert!(paginator.font_fell_back());
        assert_eq!(paginator.face().family(), "Gotham");
        assert_eq!(paginator.fit().font.size_pt, 40.0);
    }

    #[test]
    fn test_sections_never_share_pages() {
        let paginator = mono_paginator(40.0, 100.0, ContentKind::Lyrics);
        let sections = vec![
            Section::new("Verse 1", vec!["Amazing grace".into(), "How sweet the sound".into()]),
            Section::new("Empty", vec!["   ".into()]),
            Section::new("Chorus", vec!["My chains are gone".into()]),
        ];
        let result = paginator.paginate_sections(&sections);

        let labels: Vec<&str> = result.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Verse 1", "Chorus"]);
        assert_eq!(
            line_texts(&result[1].pages),
            vec![vec!["My chains are gone".to_string()]]
        );
    }

    #[test]
    fn test_scripture_uses_prose_flow_from_lyric_paginator() {
        let paginator = mono_paginator(80.0, 100.0, ContentKind::Lyrics);
        let pages = paginator.paginate_scripture(
            "For God so loved the world, that he gave his only begotten Son: Amen.",
        );

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].gap_count(), 0);
        assert_eq!(
            pages[0].text(),
            "For God so loved the world, that he gave his only begotten Son: Amen."
        );
    }

    #[test]
    fn test_other_kind_keeps_host_thresholds() {
        let config = PaginationConfig {
            rebalance: RebalanceRules {
                max_passes: 7,
                tiny_min_chars: 40,
                ..RebalanceRules::default()
            },
            ..PaginationConfig::for_kind(ContentKind::Lyrics)
        };
        let paginator = Paginator::with_face(
            test_fit(40.0, 100.0, 10.0, 0.0),
            Arc::new(HeuristicFace::monospace(1.0, 1.0)),
            config,
        );

        let scripture = paginator.config_for(ContentKind::Scripture);
        assert_eq!(scripture.kind, ContentKind::Scripture);
        assert_eq!(scripture.flow(), Flow::Prose);
        assert!(scripture.rebalance.head_borrow);
        assert!(scripture.rebalance.tail_merge);
        assert_eq!(scripture.rebalance.max_passes, 7);
        assert_eq!(scripture.rebalance.tiny_min_chars, 40);

        let lyrics = paginator.config_for(ContentKind::Lyrics);
        assert!(matches!(lyrics, Cow::Borrowed(_)));
        assert!(!lyrics.rebalance.head_borrow);
    }

    #[test]
    fn test_unavailable_scripture_has_no_pages() {
        let paginator = mono_paginator(40.0, 100.0, ContentKind::Scripture);
        assert!(paginator.paginate_scripture("[Text unavailable]").is_empty());
        assert!(paginator.paginate_lyrics::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_audit_uses_paginator_fit() {
        let paginator = mono_paginator(40.0, 100.0, ContentKind::Lyrics);
        let pages = paginator.paginate_lyrics(&["Amen"]);
        let report = paginator.audit(&pages);
        assert_eq!(report.flagged(PageFlag::Sparse), vec![0]);
    }
}
