use async_trait::async_trait;

/// Refreshes a single feed: download, parse, store new entries.
///
/// Implementations must tolerate two refreshes of the same feed running at
/// the same time; the worker pool does not serialize them.
#[cfg_attr(test, mockall::automock(type Store = ();))]
#[async_trait]
pub trait FeedRefresher: Send + Sync + 'static {
    /// Storage handle shared by every worker.
    type Store: Send + Sync + 'static;

    async fn refresh(
        &self,
        store: &Self::Store,
        user_id: i64,
        feed_id: i64,
        force_refresh: bool,
    ) -> anyhow::Result<()>;
}
