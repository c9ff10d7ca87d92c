// File: tunebot-core/src/coordinator/classify.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Known video host, optional scheme and `www.`, and a non-empty path.
static DIRECT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.?be)/.+$")
        .unwrap_or_else(|e| panic!("direct link pattern failed to compile: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Download this link as-is.
    DirectLink(String),
    /// Needs a trip through the search service first.
    SearchNeeded(String),
}

/// Total: every input is one or the other.
pub fn classify(query: &str) -> Classification {
    let trimmed = query.trim();
    if DIRECT_LINK.is_match(trimmed) {
        Classification::DirectLink(trimmed.to_string())
    } else {
        Classification::SearchNeeded(trimmed.to_string())
    }
}
