//! Parser error types.

/// Maximum number of characters of a feed kept for diagnostics.
const EXCERPT_CHARS: usize = 200;

/// Errors turning a provider feed into domain types.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Feed is not valid JSON or doesn't have the expected shape
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Feed is not well-formed XML
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Required element or field is absent
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Field is present but can't be interpreted
    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// The format has no such endpoint
    #[error("{format} feeds have no {operation}")]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },
}

/// Leading part of a feed, for logging alongside parse failures.
pub fn excerpt(feed: &[u8]) -> String {
    let text = String::from_utf8_lossy(feed);
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    if text.chars().nth(EXCERPT_CHARS).is_some() {
        excerpt.push('…');
    }
    excerpt
}

impl ParseError {
    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            ParseError::MissingField("station element").to_string(),
            "missing station element"
        );
        assert_eq!(
            ParseError::invalid("lat", "north").to_string(),
            "invalid lat: \"north\""
        );

        let err = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(ParseError::from(err).to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn excerpt_truncates_long_feeds() {
        assert_eq!(excerpt(b"<html>503</html>"), "<html>503</html>");

        let long = "x".repeat(500);
        let cut = excerpt(long.as_bytes());
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
