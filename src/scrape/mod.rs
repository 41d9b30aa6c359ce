//! Fetches an entry's web page and extracts its article content.

pub mod errors;
pub mod rules;

pub use errors::ScrapeError;
pub use rules::{SiteDirective, SiteRules, domain, domain_of};

use std::sync::Arc;

use tracing::{debug, instrument};
use url::Url;

use crate::{
    extractor::Extractor,
    fetcher::{FetchOptions, Fetcher},
};

#[derive(Debug, Clone)]
pub struct Scraper {
    fetcher: Fetcher,
    rules: Arc<SiteRules>,
}

impl Scraper {
    pub fn new(fetcher: Fetcher, rules: Arc<SiteRules>) -> Self {
        Self { fetcher, rules }
    }

    /// Downloads `website_url` and returns its extracted content.
    ///
    /// `rule_override`, when non-empty, replaces the site rule table for this
    /// call. Rules only apply when the page was served from the requested
    /// domain; a redirect to another domain always goes through readability.
    #[instrument(skip(self, rule_override, options), fields(url = %website_url))]
    pub async fn fetch(
        &self,
        website_url: &str,
        rule_override: Option<&str>,
        options: &FetchOptions,
    ) -> Result<String, ScrapeError> {
        let response = self.fetcher.fetch(website_url, options).await?;

        let extractor = self.select_extractor(website_url, &response.effective_url, rule_override);
        match &extractor {
            Extractor::Selector(rules) => {
                debug!("Using rules {:?} for {}", rules, response.effective_url)
            }
            Extractor::Readability { .. } => {
                debug!("Using readability for {}", response.effective_url)
            }
        }

        Ok(extractor.extract(&response.body)?)
    }

    /// Decides how a page is extracted once its effective URL is known.
    pub fn select_extractor(
        &self,
        requested_url: &str,
        effective_url: &Url,
        rule_override: Option<&str>,
    ) -> Extractor {
        let effective_domain = domain(effective_url);
        let same_site = domain_of(requested_url) == effective_domain;

        let rules = rule_override
            .filter(|rules| !rules.trim().is_empty())
            .or_else(|| self.rules.lookup(&effective_domain));

        match rules {
            Some(rules) if same_site => Extractor::Selector(rules.to_string()),
            _ => Extractor::Readability {
                base_url: effective_url.clone(),
            },
        }
    }
}
