//! Revalidation throttle
//!
//! A session-scoped "last validated" instant behind an async lock. The
//! tracker is constructed explicitly and passed to whoever needs it;
//! nothing here is global. State is never persisted, so a fresh process
//! starts due.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// How long a successful validation stays fresh.
pub const REVALIDATION_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Clone)]
pub struct ValidationTracker {
    last: Arc<RwLock<Option<Instant>>>,
    interval: Duration,
}

impl ValidationTracker {
    pub fn new() -> Self {
        Self::with_interval(REVALIDATION_INTERVAL)
    }

    /// Custom interval, for tests and tighter deployments.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last: Arc::new(RwLock::new(None)),
            interval,
        }
    }

    /// Due when never validated, or when the interval has elapsed.
    pub async fn is_due(&self) -> bool {
        match *self.last.read().await {
            Some(at) => at.elapsed() >= self.interval,
            None => true,
        }
    }

    pub async fn mark_validated(&self) {
        self.mark_validated_at(Instant::now()).await;
    }

    /// Record an explicit validation instant. Lets tests simulate an
    /// elapsed interval by backdating.
    pub async fn mark_validated_at(&self, at: Instant) {
        *self.last.write().await = Some(at);
    }

    pub async fn last_validated(&self) -> Option<Instant> {
        *self.last.read().await
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for ValidationTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn due_until_marked_then_due_again_after_interval() {
        let tracker = ValidationTracker::with_interval(Duration::from_millis(100));

        assert!(tracker.is_due().await, "never validated is due");

        tracker.mark_validated().await;
        assert!(!tracker.is_due().await, "fresh validation is not due");

        let past = Instant::now() - Duration::from_millis(200);
        tracker.mark_validated_at(past).await;
        assert!(tracker.is_due().await, "elapsed interval is due again");
    }

    #[tokio::test]
    async fn default_interval_is_two_hours() {
        let tracker = ValidationTracker::new();
        assert_eq!(tracker.interval(), Duration::from_secs(7200));
        assert!(tracker.last_validated().await.is_none());
    }
}
