//! Wrapping, packing and rebalancing of units into pages

mod engine;
mod line_break;
mod pagination;
mod rebalance;
mod token;

pub use engine::{paginate_with, PaginationConfig};
pub use line_break::{DisplayLine, Flow, LineWrapper, WrapRules, DEFAULT_CONNECTORS};
pub use pagination::{Packer, Page};
pub use rebalance::{RebalanceRules, Rebalancer};

/// Fit spec with exact numbers and no safety margins
#[cfg(test)]
pub(crate) fn test_fit(width: f32, height: f32, line_height: f32, unit_gap: f32) -> crate::geometry::FitSpec {
    crate::geometry::FitSpec {
        usable_width: width,
        usable_height: height,
        line_height,
        unit_gap,
        width_safety: 1.0,
        height_safety: 1.0,
        font: crate::font::FontRequest::new("Monospace", 1.0),
    }
}
