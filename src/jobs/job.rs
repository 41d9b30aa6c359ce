use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Request to refresh one feed on behalf of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    pub feed_id: i64,
    pub user_id: i64,
}

impl Job {
    pub fn new(feed_id: i64, user_id: i64) -> Self {
        Self { feed_id, user_id }
    }
}

pub type JobSender = mpsc::Sender<Job>;
pub type JobReceiver = mpsc::Receiver<Job>;

/// Creates the shared queue between the scheduler and the worker pool.
///
/// Jobs are delivered in FIFO order with no deduplication. Senders wait when
/// the queue is full.
pub fn job_channel(capacity: usize) -> (JobSender, JobReceiver) {
    mpsc::channel(capacity.max(1))
}
