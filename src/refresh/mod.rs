//! Reference feed refresh: download, parse, store new entries and crawl their
//! original pages when the feed asks for it.

pub mod parser;

use std::marker::PhantomData;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::{
    entities::{Entry, Feed},
    extractor::cleaner::sanitize,
    fetcher::{FetchOptions, Fetcher},
    jobs::FeedRefresher,
    refresh::parser::{ParsedEntry, ParsedFeed, parse_feed},
    scrape::Scraper,
    store::FeedStore,
};

pub struct FeedRefreshService<S> {
    fetcher: Fetcher,
    scraper: Scraper,
    _store: PhantomData<fn() -> S>,
}

impl<S: FeedStore> FeedRefreshService<S> {
    pub fn new(fetcher: Fetcher, scraper: Scraper) -> Self {
        Self {
            fetcher,
            scraper,
            _store: PhantomData,
        }
    }

    async fn download_feed(&self, feed: &Feed, options: &FetchOptions) -> Result<ParsedFeed> {
        let body = self
            .fetcher
            .download(&feed.feed_url, options)
            .await
            .with_context(|| format!("unable to download feed {}", feed.feed_url))?;
        parse_feed(&body)
    }

    fn build_entry(&self, feed: &Feed, parsed: ParsedEntry) -> Entry {
        let hash = parsed.hash();
        let base_url = Url::parse(&parsed.url)
            .or_else(|_| Url::parse(&feed.feed_url))
            .ok();
        let content = match &base_url {
            Some(base_url) => sanitize(&parsed.content, base_url),
            None => parsed.content,
        };

        Entry {
            feed_id: feed.id,
            user_id: feed.user_id,
            hash,
            title: parsed.title,
            url: parsed.url,
            author: parsed.author,
            content,
            published_at: parsed.published_at.unwrap_or_else(Utc::now),
        }
    }

    /// Saves the entries not seen before and returns how many were stored.
    async fn store_entries(
        &self,
        store: &S,
        feed: &Feed,
        entries: Vec<ParsedEntry>,
        force_refresh: bool,
        options: &FetchOptions,
    ) -> Result<usize> {
        let mut created = 0;
        for parsed_entry in entries {
            if !force_refresh && store.entry_exists(feed.id, &parsed_entry.hash()).await? {
                continue;
            }

            let mut entry = self.build_entry(feed, parsed_entry);
            if feed.crawler {
                self.crawl_entry(feed, &mut entry, options).await;
            }

            store.save_entry(&entry).await?;
            created += 1;
        }
        Ok(created)
    }

    /// Replaces the entry content with the scraped article. Failures leave
    /// the feed-provided content in place.
    async fn crawl_entry(&self, feed: &Feed, entry: &mut Entry, options: &FetchOptions) {
        let Ok(entry_url) = Url::parse(&entry.url) else {
            debug!("Skipping crawl of entry without absolute URL: {:?}", entry.url);
            return;
        };

        match self
            .scraper
            .fetch(entry_url.as_str(), feed.scraper_rules.as_deref(), options)
            .await
        {
            Ok(content) if content.trim().is_empty() => {
                debug!("No content extracted from {}", entry_url);
            }
            Ok(content) => {
                entry.content = sanitize(&content, &entry_url);
            }
            Err(e) if e.is_unsupported_content_type() => {
                debug!("Keeping feed content for {}: {}", entry_url, e);
            }
            Err(e) => {
                warn!("Unable to crawl {}: {}", entry_url, e);
            }
        }
    }
}

#[async_trait]
impl<S: FeedStore> FeedRefresher for FeedRefreshService<S> {
    type Store = S;

    #[instrument(skip(self, store))]
    async fn refresh(
        &self,
        store: &S,
        user_id: i64,
        feed_id: i64,
        force_refresh: bool,
    ) -> Result<()> {
        let mut feed = store
            .feed(user_id, feed_id)
            .await?
            .ok_or_else(|| anyhow!("feed #{} not found for user #{}", feed_id, user_id))?;

        feed.checked_at = Some(Utc::now());
        let options = feed.fetch_options();

        let parsed = match self.download_feed(&feed, &options).await {
            Ok(parsed) => parsed,
            Err(e) => {
                feed.parsing_error_count += 1;
                feed.parsing_error_message = Some(format!("{:#}", e));
                store.update_feed(&feed).await?;
                return Err(e);
            }
        };

        if feed.title.is_empty()
            && let Some(title) = parsed.title
        {
            feed.title = title;
        }
        if feed.site_url.is_none() {
            feed.site_url = parsed.site_url;
        }

        let created = match self
            .store_entries(store, &feed, parsed.entries, force_refresh, &options)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                store.update_feed(&feed).await?;
                return Err(e);
            }
        };

        feed.parsing_error_count = 0;
        feed.parsing_error_message = None;
        store.update_feed(&feed).await?;

        info!("Feed #{} refreshed, {} new entries", feed.id, created);
        Ok(())
    }
}
