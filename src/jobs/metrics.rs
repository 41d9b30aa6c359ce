use std::time::Duration;

use metrics::{Unit, describe_histogram, histogram};

pub const BACKGROUND_FEED_REFRESH_DURATION: &str = "background_feed_refresh_duration_seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Success,
    Error,
}

impl RefreshStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Sink for per-job refresh observations.
///
/// Recording must not fail or block; the worker does not look at the result.
pub trait MetricsCollector: Send + Sync {
    fn observe_refresh(&self, status: RefreshStatus, elapsed: Duration);
}

/// Records refresh durations through the `metrics` facade. Without an
/// installed recorder this is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        describe_histogram!(
            BACKGROUND_FEED_REFRESH_DURATION,
            Unit::Seconds,
            "Processing time to refresh feeds from the background workers"
        );
        Self
    }
}

impl MetricsCollector for MetricsRecorder {
    fn observe_refresh(&self, status: RefreshStatus, elapsed: Duration) {
        histogram!(BACKGROUND_FEED_REFRESH_DURATION, "status" => status.as_str())
            .record(elapsed.as_secs_f64());
    }
}
