//! Persistence seam used by the refresh service.

pub mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::entities::{Entry, Feed};

/// Storage shared by every worker. Implementations handle their own
/// synchronization.
#[async_trait]
pub trait FeedStore: Send + Sync + 'static {
    async fn feed(&self, user_id: i64, feed_id: i64) -> Result<Option<Feed>>;

    async fn update_feed(&self, feed: &Feed) -> Result<()>;

    async fn entry_exists(&self, feed_id: i64, hash: &str) -> Result<bool>;

    /// Inserts or replaces the entry identified by `(feed_id, hash)`.
    async fn save_entry(&self, entry: &Entry) -> Result<()>;
}
