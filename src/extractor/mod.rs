//! Article content extraction strategies.
//!
//! A page is handled by exactly one `Extractor`: either site-specific CSS
//! selector rules or the generic readability heuristic. The choice is made by
//! the caller before extraction starts.

pub mod cleaner;
pub mod reader;
pub mod selector;

#[cfg(test)]
mod tests;

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unable to parse document: {0}")]
    Readability(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extractor {
    /// Site rules: keep only elements matching the selector.
    Selector(String),
    /// Generic main-content detection. The base URL resolves relative links.
    Readability { base_url: Url },
}

impl Extractor {
    pub fn extract(&self, html: &str) -> Result<String, ExtractError> {
        match self {
            Self::Selector(rules) => selector::extract(html, rules),
            Self::Readability { base_url } => reader::extract(html, base_url),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Selector(_) => "selector",
            Self::Readability { .. } => "readability",
        }
    }
}
