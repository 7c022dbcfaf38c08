//! Error types for the fallible setup paths
//!
//! Layout itself never fails: bad geometry falls back to defaults, missing
//! fonts fall back through the font chain and oversized content is
//! hard-split. Only registering fonts, protecting spans and decoding host
//! input can return an error.

use thiserror::Error;

/// Errors surfaced while preparing inputs for pagination
#[derive(Debug, Error)]
pub enum Error {
    /// Font bytes could not be parsed as TrueType/OpenType
    #[error("failed to parse font data: {0}")]
    FontParse(String),

    /// A font source has no face for the requested family
    #[error("font family not found: {family}")]
    FontNotFound { family: String },

    /// A protected range does not lie on the unit's text
    #[error("invalid protected span {start}..{end} for text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// Malformed JSON handed across the host boundary
    #[error("invalid json input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::FontNotFound {
            family: "Gotham".to_string(),
        };
        assert_eq!(err.to_string(), "font family not found: Gotham");

        let err = Error::InvalidSpan {
            start: 4,
            end: 40,
            len: 10,
        };
        assert_eq!(
            err.to_string(),
            "invalid protected span 4..40 for text of length 10"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
