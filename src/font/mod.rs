//! Font metrics for fitting text
//!
//! A [`FontFace`] measures strings in points. Faces come from a ranked
//! [`FontChain`]: the declared family, then common fallback families, then
//! a [`HeuristicFace`] that is always available, so a missing font never
//! aborts pagination.

mod heuristic;
mod library;

pub use heuristic::HeuristicFace;
pub use library::{FontLibrary, TtfFace};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Families tried after the declared one, in order
pub const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "Calibri",
];

/// Vertical metrics of a face at its nominal size, in points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl LineMetrics {
    /// Ascent plus descent
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// A resolved font at a fixed size
pub trait FontFace: Send + Sync {
    /// Family name of the loaded face
    fn family(&self) -> &str;

    /// Nominal size in points
    fn size_pt(&self) -> f32;

    /// Advance width of `text` in points
    fn measure(&self, text: &str) -> f32;

    /// Ascent and descent in points
    fn metrics(&self) -> LineMetrics;
}

impl fmt::Debug for dyn FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family())
            .field("size_pt", &self.size_pt())
            .finish()
    }
}

/// Family and size a container asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontRequest {
    pub family: String,
    pub size_pt: f32,
}

impl FontRequest {
    pub fn new(family: impl Into<String>, size_pt: f32) -> Self {
        Self {
            family: family.into(),
            size_pt,
        }
    }
}

/// Anything that can load a face by family name
pub trait FontSource: Send + Sync {
    fn load(&self, family: &str, size_pt: f32) -> Result<Arc<dyn FontFace>>;
}

/// Outcome of resolving a [`FontRequest`] through the chain
#[derive(Clone)]
pub struct ResolvedFace {
    pub face: Arc<dyn FontFace>,
    /// Family actually used
    pub family: String,
    /// True when the declared family was not available
    pub fell_back: bool,
}

impl fmt::Debug for ResolvedFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFace")
            .field("family", &self.family)
            .field("fell_back", &self.fell_back)
            .finish()
    }
}

/// Ranked fallback chain over injected font sources
pub struct FontChain {
    sources: Vec<Arc<dyn FontSource>>,
    fallback_families: Vec<String>,
}

impl Default for FontChain {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            fallback_families: FALLBACK_FAMILIES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FontChain {
    /// Chain with no sources; every request resolves to the heuristic face
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; earlier sources win
    pub fn with_source(mut self, source: Arc<dyn FontSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the fallback family list
    pub fn with_fallbacks<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_families = families.into_iter().map(Into::into).collect();
        self
    }

    fn load_family(&self, family: &str, size_pt: f32) -> Option<Arc<dyn FontFace>> {
        self.sources
            .iter()
            .find_map(|source| source.load(family, size_pt).ok())
    }

    /// Resolve a request: declared family, then fallbacks, then the heuristic face
    pub fn resolve(&self, request: &FontRequest) -> ResolvedFace {
        if let Some(face) = self.load_family(&request.family, request.size_pt) {
            return ResolvedFace {
                family: face.family().to_string(),
                face,
                fell_back: false,
            };
        }

        for family in &self.fallback_families {
            if family.eq_ignore_ascii_case(&request.family) {
                continue;
            }
            if let Some(face) = self.load_family(family, request.size_pt) {
                log::warn!(
                    "font family {:?} unavailable, falling back to {:?}",
                    request.family,
                    family
                );
                return ResolvedFace {
                    family: face.family().to_string(),
                    face,
                    fell_back: true,
                };
            }
        }

        log::warn!(
            "no font source for {:?}, using heuristic metrics",
            request.family
        );
        let face = HeuristicFace::proportional(request.family.clone(), request.size_pt);
        ResolvedFace {
            family: request.family.clone(),
            face: Arc::new(face),
            fell_back: true,
        }
    }

    /// Width of `text` in `family` at `size_pt`
    pub fn measure(&self, text: &str, family: &str, size_pt: f32) -> f32 {
        self.resolve(&FontRequest::new(family, size_pt))
            .face
            .measure(text)
    }

    /// Ascent and descent of `family` at `size_pt`
    pub fn line_metrics(&self, family: &str, size_pt: f32) -> LineMetrics {
        self.resolve(&FontRequest::new(family, size_pt))
            .face
            .metrics()
    }
}

/// Measure through a face, treating invalid widths as a broken face
pub(crate) fn checked_width(face: &dyn FontFace, text: &str) -> f32 {
    let width = face.measure(text);
    assert!(
        width.is_finite() && width >= 0.0,
        "font face {:?} returned invalid width {} for {:?}",
        face.family(),
        width,
        text
    );
    width
}
