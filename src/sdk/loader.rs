//! Bounded polling until a vendor SDK is usable
//!
//! Injecting the script is a one-shot side effect; readiness is then polled
//! on a fixed interval. A script that never loads and an SDK that is merely
//! slow look the same from here: both end in `LoadTimeout` once the attempt
//! budget is spent.

use crate::{
    core::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS},
    providers::host::VendorHost,
    runtime::Scheduler,
    sdk::script::ScriptAsset,
    MapError, Result,
};
use fxhash::FxHashSet as HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Successful readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    /// Probes performed, the successful one included
    pub probes: u32,
}

/// Loads vendor scripts and waits for them with a bounded retry
pub struct ScriptLoader<S> {
    scheduler: S,
    interval: Duration,
    max_attempts: u32,
    injected: Mutex<HashSet<String>>,
}

impl<S: Scheduler> ScriptLoader<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            injected: Mutex::new(HashSet::default()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Probe budget; at least one probe is always made
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Polls `probe` every interval until it holds or the budget runs out.
    ///
    /// Exactly `max_attempts` probes are made on failure and none after.
    pub async fn ensure_ready<P>(&self, mut probe: P) -> Result<Ready>
    where
        P: FnMut() -> bool,
    {
        let started = instant::Instant::now();
        let mut remaining = self.max_attempts;
        let mut probes = 0;

        loop {
            self.scheduler.sleep(self.interval).await;
            probes += 1;

            if probe() {
                log::debug!("SDK ready after {} probes ({:?})", probes, started.elapsed());
                return Ok(Ready { probes });
            }

            remaining -= 1;
            if remaining == 0 {
                log::debug!("SDK still missing after {} probes, giving up", probes);
                return Err(MapError::LoadTimeout { attempts: probes });
            }
        }
    }

    /// Injects `asset` (once per URL) and waits for its global
    pub async fn load(&self, asset: &ScriptAsset, host: &mut dyn VendorHost) -> Result<Ready> {
        if self.mark_injected(&asset.url) {
            log::debug!("injecting SDK script {}", asset.url);
            if let Err(e) = host.load_script(&asset.url) {
                // Surfaces as LoadTimeout below
                log::warn!("script {} failed to load: {}", asset.url, e);
            }
        }

        let host: &dyn VendorHost = host;
        self.ensure_ready(|| host.has_global(&asset.global)).await
    }

    /// True the first time `url` is seen
    fn mark_injected(&self, url: &str) -> bool {
        match self.injected.lock() {
            Ok(mut injected) => injected.insert(url.to_string()),
            Err(_) => true,
        }
    }
}

#[cfg(feature = "tokio-runtime")]
impl ScriptLoader<crate::runtime::TokioScheduler> {
    /// Loader sleeping on Tokio timers with the default policy
    pub fn tokio() -> Self {
        Self::new(crate::runtime::TokioScheduler)
    }
}
