use std::sync::Arc;

use anyhow::Result;
use feedcore::{
    config::Config,
    entities::Feed,
    fetcher::Fetcher,
    jobs::{Job, MetricsRecorder, WorkerPool, job_channel},
    refresh::FeedRefreshService,
    scrape::{Scraper, SiteRules},
    store::MemoryStore,
};
use tracing::{info, warn};

const DEFAULT_USER_ID: i64 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let fetcher = Fetcher::new(config.http_client().clone());
    let scraper = Scraper::new(fetcher.clone(), Arc::new(SiteRules::predefined()));
    let refresher = Arc::new(FeedRefreshService::new(fetcher, scraper));

    let store = Arc::new(MemoryStore::new());
    let feeds: Vec<Feed> = config
        .feed_urls()
        .iter()
        .map(|url| store.create_feed(Feed::new(DEFAULT_USER_ID, url.as_str()).with_crawler(true)))
        .collect();

    if feeds.is_empty() {
        warn!("No feeds configured, set FEED_URLS to a comma-separated list");
    }

    let (sender, receiver) = job_channel(config.job_queue_capacity());

    let mut pool = WorkerPool::new(config.worker_pool_size(), refresher, store.clone());
    if config.has_metrics_collector() {
        pool = pool.with_metrics(Arc::new(MetricsRecorder::new()));
    }

    // Producer: one refresh per configured feed.
    tokio::spawn(async move {
        for feed in feeds {
            if sender.send(Job::new(feed.id, feed.user_id)).await.is_err() {
                warn!("Worker pool stopped before all feeds were queued");
                return;
            }
        }
        info!("All feeds queued");
        // Keep the queue open so workers stay up until Ctrl-C.
        sender.closed().await;
    });

    pool.run(receiver).await?;

    for feed in store.feeds() {
        info!(
            "Feed #{} {:?}: {} entries, {} parsing errors",
            feed.id,
            feed.title,
            store.entries(feed.id).len(),
            feed.parsing_error_count
        );
    }

    Ok(())
}
