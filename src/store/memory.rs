use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    entities::{Entry, Feed},
    store::FeedStore,
};

/// In-process store. Concurrent writes to the same key are last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryStore {
    feeds: DashMap<i64, Feed>,
    entries: DashMap<(i64, String), Entry>,
    last_feed_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a feed and returns it with its assigned id.
    pub fn create_feed(&self, mut feed: Feed) -> Feed {
        feed.id = self.last_feed_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.feeds.insert(feed.id, feed.clone());
        feed
    }

    pub fn feeds(&self) -> Vec<Feed> {
        let mut feeds: Vec<Feed> = self.feeds.iter().map(|f| f.value().clone()).collect();
        feeds.sort_by_key(|f| f.id);
        feeds
    }

    /// Entries of a feed, newest first.
    pub fn entries(&self, feed_id: i64) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == feed_id)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        entries
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn feed(&self, user_id: i64, feed_id: i64) -> Result<Option<Feed>> {
        Ok(self
            .feeds
            .get(&feed_id)
            .filter(|f| f.user_id == user_id)
            .map(|f| f.value().clone()))
    }

    async fn update_feed(&self, feed: &Feed) -> Result<()> {
        match self.feeds.get_mut(&feed.id) {
            Some(mut existing) => {
                *existing = feed.clone();
                Ok(())
            }
            None => bail!("feed #{} does not exist", feed.id),
        }
    }

    async fn entry_exists(&self, feed_id: i64, hash: &str) -> Result<bool> {
        Ok(self.entries.contains_key(&(feed_id, hash.to_string())))
    }

    async fn save_entry(&self, entry: &Entry) -> Result<()> {
        self.entries
            .insert((entry.feed_id, entry.hash.clone()), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(feed_id: i64, hash: &str, day: u32) -> Entry {
        Entry {
            feed_id,
            user_id: 1,
            hash: hash.to_string(),
            title: format!("Entry {hash}"),
            url: format!("https://example.com/{hash}"),
            author: None,
            content: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_feed_scoped_to_user() {
        let store = MemoryStore::new();
        let feed = store.create_feed(Feed::new(1, "https://example.com/feed.xml"));

        assert_eq!(feed.id, 1);
        assert!(store.feed(1, feed.id).await.unwrap().is_some());
        assert!(store.feed(2, feed.id).await.unwrap().is_none());
        assert!(store.feed(1, 99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_entry_is_idempotent() {
        let store = MemoryStore::new();
        store.save_entry(&entry(1, "a", 1)).await.unwrap();
        store.save_entry(&entry(1, "a", 1)).await.unwrap();
        store.save_entry(&entry(1, "b", 2)).await.unwrap();
        store.save_entry(&entry(2, "a", 3)).await.unwrap();

        assert!(store.entry_exists(1, "a").await.unwrap());
        assert!(!store.entry_exists(1, "c").await.unwrap());

        let entries = store.entries(1);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hash, "b");
    }

    #[tokio::test]
    async fn test_update_unknown_feed_fails() {
        let store = MemoryStore::new();
        let mut feed = Feed::new(1, "https://example.com/feed.xml");
        feed.id = 42;
        assert!(store.update_feed(&feed).await.is_err());
    }
}
