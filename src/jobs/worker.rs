use crate::jobs::{FeedRefresher, Job, JobReceiver, MetricsCollector, RefreshStatus};
use anyhow::Result;
use std::{sync::Arc, time::Instant};
use tokio::{signal, sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span};

/// Fixed-size pool of workers draining a shared job queue.
///
/// Each worker handles one job at a time. A failing or panicking refresh is
/// logged and metered, then the worker moves on to the next job.
pub struct WorkerPool<R: FeedRefresher> {
    size: usize,
    refresher: Arc<R>,
    store: Arc<R::Store>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    shutdown_token: CancellationToken,
}

struct WorkerContext<R: FeedRefresher> {
    refresher: Arc<R>,
    store: Arc<R::Store>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

/// Running workers. Dropping the handle does not stop them.
pub struct WorkerPoolHandle {
    handles: Vec<JoinHandle<()>>,
    shutdown_token: CancellationToken,
}

impl<R: FeedRefresher> WorkerPool<R> {
    pub fn new(size: usize, refresher: Arc<R>, store: Arc<R::Store>) -> Self {
        Self {
            size: size.max(1),
            refresher,
            store,
            metrics: None,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Emits one duration observation per job.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_shutdown_token(mut self, shutdown_token: CancellationToken) -> Self {
        self.shutdown_token = shutdown_token;
        self
    }

    /// Starts the workers in the background.
    ///
    /// Workers exit when the shutdown token is cancelled (after finishing the
    /// job in hand) or when every sender is gone and the queue is empty.
    pub fn spawn(self, receiver: JobReceiver) -> WorkerPoolHandle {
        info!("Starting worker pool with {} workers", self.size);

        let context = Arc::new(WorkerContext {
            refresher: self.refresher,
            store: self.store,
            metrics: self.metrics,
        });
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (1..=self.size)
            .map(|worker_id| {
                tokio::spawn(
                    run_worker(
                        worker_id,
                        context.clone(),
                        receiver.clone(),
                        self.shutdown_token.clone(),
                    )
                    .instrument(info_span!("worker", id = worker_id)),
                )
            })
            .collect();

        WorkerPoolHandle {
            handles,
            shutdown_token: self.shutdown_token,
        }
    }

    /// Runs the pool until Ctrl-C, then lets in-flight jobs finish.
    pub async fn run(self, receiver: JobReceiver) -> Result<()> {
        let handle = self.spawn(receiver);

        let shutdown_token = handle.shutdown_token();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_token.cancel();
        });

        handle.join().await
    }
}

impl WorkerPoolHandle {
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Stops accepting new jobs. In-flight jobs run to completion.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }

    /// Waits for every worker to exit.
    pub async fn join(self) -> Result<()> {
        for handle in self.handles {
            handle.await?;
        }
        info!("All workers stopped");
        Ok(())
    }
}

async fn run_worker<R: FeedRefresher>(
    worker_id: usize,
    context: Arc<WorkerContext<R>>,
    receiver: Arc<Mutex<JobReceiver>>,
    shutdown_token: CancellationToken,
) {
    debug!("Worker #{} started", worker_id);

    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown_token.cancelled() => break,
            job = next_job(&receiver) => match job {
                Some(job) => job,
                None => break,
            },
        };

        debug!(
            "Worker #{} received feed #{} for user #{}",
            worker_id, job.feed_id, job.user_id
        );
        context.process_job(job).await;
    }

    debug!("Worker #{} stopped", worker_id);
}

async fn next_job(receiver: &Mutex<JobReceiver>) -> Option<Job> {
    receiver.lock().await.recv().await
}

impl<R: FeedRefresher> WorkerContext<R> {
    async fn process_job(&self, job: Job) {
        let start = Instant::now();

        // Run the refresh in its own task so a panic is contained to this job.
        let refresher = self.refresher.clone();
        let store = self.store.clone();
        let result = tokio::spawn(
            async move {
                refresher
                    .refresh(&store, job.user_id, job.feed_id, false)
                    .await
            }
            .in_current_span(),
        )
        .await
        .unwrap_or_else(|join_err| Err(anyhow::anyhow!("refresh task failed: {}", join_err)));

        let status = if result.is_ok() {
            RefreshStatus::Success
        } else {
            RefreshStatus::Error
        };

        if let Some(metrics) = &self.metrics {
            metrics.observe_refresh(status, start.elapsed());
        }

        if let Err(e) = result {
            error!(
                "Refreshing the feed #{} returned this error: {:#}",
                job.feed_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{MockFeedRefresher, job_channel};
    use async_trait::async_trait;
    use std::{
        sync::{
            Mutex as StdMutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingMetrics {
        observed: StdMutex<Vec<RefreshStatus>>,
    }

    impl MetricsCollector for RecordingMetrics {
        fn observe_refresh(&self, status: RefreshStatus, _elapsed: Duration) {
            self.observed.lock().unwrap().push(status);
        }
    }

    #[derive(Default)]
    struct SlowRefresher {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        feeds: StdMutex<Vec<i64>>,
        started: Notify,
    }

    #[async_trait]
    impl FeedRefresher for SlowRefresher {
        type Store = ();

        async fn refresh(
            &self,
            _store: &(),
            _user_id: i64,
            feed_id: i64,
            _force_refresh: bool,
        ) -> anyhow::Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.started.notify_one();

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.feeds.lock().unwrap().push(feed_id);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_every_job_is_processed_once() {
        let refresher = Arc::new(SlowRefresher::default());
        let (sender, receiver) = job_channel(64);

        for feed_id in 1..=20 {
            sender.send(Job::new(feed_id, 1)).await.unwrap();
        }
        drop(sender);

        let pool = WorkerPool::new(4, refresher.clone(), Arc::new(()));
        pool.spawn(receiver).join().await.unwrap();

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 20);
        let max = refresher.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 4, "{max} jobs ran at once on 4 workers");
        assert!(max > 1, "jobs never overlapped");

        let mut feeds = refresher.feeds.lock().unwrap().clone();
        feeds.sort_unstable();
        assert_eq!(feeds, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_single_worker_is_sequential() {
        let refresher = Arc::new(SlowRefresher::default());
        let (sender, receiver) = job_channel(8);

        for feed_id in [3, 1, 2] {
            sender.send(Job::new(feed_id, 7)).await.unwrap();
        }
        drop(sender);

        WorkerPool::new(1, refresher.clone(), Arc::new(()))
            .spawn(receiver)
            .join()
            .await
            .unwrap();

        assert_eq!(refresher.max_in_flight.load(Ordering::SeqCst), 1);
        // One worker drains the FIFO queue in order.
        assert_eq!(*refresher.feeds.lock().unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_failures_are_metered_and_do_not_stop_worker() {
        let mut refresher = MockFeedRefresher::new();
        refresher
            .expect_refresh()
            .times(3)
            .returning(|_, _, feed_id, force_refresh| {
                assert!(!force_refresh);
                if feed_id == 2 {
                    Err(anyhow::anyhow!("unable to download web page"))
                } else {
                    Ok(())
                }
            });

        let metrics = Arc::new(RecordingMetrics::default());
        let (sender, receiver) = job_channel(8);
        for feed_id in 1..=3 {
            sender.send(Job::new(feed_id, 1)).await.unwrap();
        }
        drop(sender);

        WorkerPool::new(1, Arc::new(refresher), Arc::new(()))
            .with_metrics(metrics.clone())
            .spawn(receiver)
            .join()
            .await
            .unwrap();

        assert_eq!(
            *metrics.observed.lock().unwrap(),
            vec![
                RefreshStatus::Success,
                RefreshStatus::Error,
                RefreshStatus::Success
            ]
        );
    }

    struct PanickingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedRefresher for PanickingRefresher {
        type Store = ();

        async fn refresh(&self, _: &(), _: i64, feed_id: i64, _: bool) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if feed_id == 1 {
                panic!("corrupted feed");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_refresh_is_contained() {
        let refresher = Arc::new(PanickingRefresher {
            calls: AtomicUsize::new(0),
        });
        let metrics = Arc::new(RecordingMetrics::default());
        let (sender, receiver) = job_channel(8);
        sender.send(Job::new(1, 1)).await.unwrap();
        sender.send(Job::new(2, 1)).await.unwrap();
        drop(sender);

        WorkerPool::new(1, refresher.clone(), Arc::new(()))
            .with_metrics(metrics.clone())
            .spawn(receiver)
            .join()
            .await
            .unwrap();

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *metrics.observed.lock().unwrap(),
            vec![RefreshStatus::Error, RefreshStatus::Success]
        );
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_job_only() {
        let refresher = Arc::new(SlowRefresher::default());
        let (sender, receiver) = job_channel(8);
        for feed_id in 1..=5 {
            sender.send(Job::new(feed_id, 1)).await.unwrap();
        }

        let handle = WorkerPool::new(1, refresher.clone(), Arc::new(())).spawn(receiver);

        refresher.started.notified().await;
        handle.shutdown();
        handle.join().await.unwrap();

        // The job in hand finished; queued jobs were left alone.
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.in_flight.load(Ordering::SeqCst), 0);
        drop(sender);
    }
}
