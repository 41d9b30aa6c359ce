use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fetcher::FetchOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub user_id: i64,
    pub feed_url: String,
    pub site_url: Option<String>,
    pub title: String,
    /// Fetch the original page of new entries and replace their content.
    pub crawler: bool,
    /// Selector used instead of the site rule table when crawling.
    pub scraper_rules: Option<String>,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub allow_self_signed_certificates: bool,
    pub fetch_via_proxy: bool,
    pub parsing_error_count: i32,
    pub parsing_error_message: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl Feed {
    pub fn new(user_id: i64, feed_url: impl Into<String>) -> Self {
        Self {
            id: 0,
            user_id,
            feed_url: feed_url.into(),
            site_url: None,
            title: String::new(),
            crawler: false,
            scraper_rules: None,
            user_agent: None,
            cookie: None,
            allow_self_signed_certificates: false,
            fetch_via_proxy: false,
            parsing_error_count: 0,
            parsing_error_message: None,
            checked_at: None,
        }
    }

    pub fn with_crawler(mut self, crawler: bool) -> Self {
        self.crawler = crawler;
        self
    }

    pub fn with_scraper_rules(mut self, rules: impl Into<String>) -> Self {
        self.scraper_rules = Some(rules.into());
        self
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            cookie: self.cookie.clone(),
            allow_self_signed_certificates: self.allow_self_signed_certificates,
            use_proxy: self.fetch_via_proxy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub feed_id: i64,
    pub user_id: i64,
    /// Stable identity of the entry within its feed.
    pub hash: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub content: String,
    pub published_at: DateTime<Utc>,
}
