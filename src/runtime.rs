//! Runtime abstraction layer for timed waits
//!
//! The script loader never sleeps directly: it waits through a [`Scheduler`]
//! so the same polling code runs on Tokio, inside a host event loop, or in
//! tests on virtual time.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

/// Something that can suspend the current task for a while
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

/// Tokio timer based scheduler
#[cfg(feature = "tokio-runtime")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "tokio-runtime")]
#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Scheduler on virtual time: every sleep completes at once and is recorded
#[derive(Debug, Default)]
pub struct ManualScheduler {
    sleeps: AtomicU32,
    elapsed_ms: AtomicU64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps requested so far
    pub fn sleeps(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Virtual time that has passed
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_records_virtual_time() {
        let scheduler = ManualScheduler::new();
        futures::executor::block_on(async {
            scheduler.sleep(Duration::from_millis(10)).await;
            scheduler.sleep(Duration::from_millis(15)).await;
        });

        assert_eq!(scheduler.sleeps(), 2);
        assert_eq!(scheduler.elapsed(), Duration::from_millis(25));
    }

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_tokio_scheduler_sleeps() {
        let started = std::time::Instant::now();
        TokioScheduler.sleep(Duration::from_millis(10)).await;
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
