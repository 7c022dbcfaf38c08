//! Pagination pipeline: tokenize, pack, rebalance

use crate::content::{ContentKind, SemanticUnit};
use crate::font::FontFace;
use crate::geometry::FitSpec;
use crate::layout::line_break::{Flow, LineWrapper, WrapRules};
use crate::layout::pagination::{Packer, Page};
use crate::layout::rebalance::{RebalanceRules, Rebalancer};
use crate::layout::token::tokenize;
use serde::{Deserialize, Serialize};

/// Everything that shapes a pagination run besides geometry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub kind: ContentKind,
    pub wrap: WrapRules,
    pub rebalance: RebalanceRules,
}

impl PaginationConfig {
    /// Defaults suited to a content kind
    pub fn for_kind(kind: ContentKind) -> Self {
        Self {
            kind,
            wrap: WrapRules::default(),
            rebalance: RebalanceRules::for_kind(kind),
        }
    }

    pub fn flow(&self) -> Flow {
        match self.kind {
            ContentKind::Lyrics => Flow::Stanza,
            ContentKind::Scripture => Flow::Prose,
        }
    }
}

/// Paginate units with an already resolved face
pub fn paginate_with(
    units: &[SemanticUnit],
    fit: &FitSpec,
    face: &dyn FontFace,
    config: &PaginationConfig,
) -> Vec<Page> {
    let wrapper = LineWrapper::new(face, &config.wrap);
    let tokens = tokenize(units, wrapper.measure(), fit.max_line_width());
    if tokens.is_empty() {
        return Vec::new();
    }

    let packer = Packer::new(&wrapper, fit, config.flow());
    let packed = packer.pack_tokens(&tokens);
    let packed_count = packed.len();

    let pages = Rebalancer::new(&packer, &config.rebalance).rebalance_tokens(&tokens, packed);
    log::debug!(
        "paginated {} units into {} pages ({} before rebalancing)",
        units.len(),
        pages.len(),
        packed_count
    );
    pages
}
