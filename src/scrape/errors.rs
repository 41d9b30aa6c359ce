use thiserror::Error;

use crate::{extractor::ExtractError, fetcher::FetchError};

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("scraper: {0}")]
    Fetch(#[from] FetchError),

    #[error("scraper: {0}")]
    Extract(#[from] ExtractError),
}

impl ScrapeError {
    /// The page exists but is not HTML. Callers keep the entry as is.
    pub fn is_unsupported_content_type(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::UnsupportedContentType(_)))
    }
}
