// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser pool for parallel exploration
//!
//! Leases a fixed number of exclusive browser handles. Handles are created
//! lazily, reset and reused when returned healthy, and discarded when
//! returned unhealthy; the lease count never drops below the configured
//! size, a replacement is created on the next acquire instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{Browser, BrowserFactory};
use crate::error::{Error, Result};
use crate::state::{Action, Snapshot};

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of handles that may be leased at once
    pub size: usize,
    /// Extra attempts after a failed handle creation
    pub creation_retries: u32,
    /// Delay between creation attempts
    pub retry_backoff: Duration,
    /// Upper bound on resetting a returned handle
    pub reset_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 1,
            creation_retries: 2,
            retry_backoff: Duration::from_millis(500),
            reset_timeout: Duration::from_secs(10),
        }
    }
}

impl PoolConfig {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn creation_retries(mut self, retries: u32) -> Self {
        self.creation_retries = retries;
        self
    }

    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

/// Pool statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolStats {
    /// Handles created through the factory
    pub browsers_created: u64,
    /// Handles closed because they were unhealthy or the pool shut down
    pub browsers_discarded: u64,
    /// Failed creation attempts
    pub creation_failures: u64,
    /// Total leases handed out
    pub leases: u64,
    /// Leases returned healthy
    pub healthy_returns: u64,
    /// Currently leased handles
    pub active: u64,
    /// Peak concurrent leases
    pub peak_active: u64,
    /// Total wait time for acquiring handles (ms)
    pub total_wait_ms: u64,
}

/// Stand-in left behind after a lease gives up its handle
struct Released;

#[async_trait]
impl Browser for Released {
    fn id(&self) -> &str {
        "released"
    }

    async fn navigate(&mut self, _url: &str) -> Result<()> {
        Err(Error::BrowserClosed)
    }

    async fn snapshot(&mut self) -> Result<Snapshot> {
        Err(Error::BrowserClosed)
    }

    async fn fire(&mut self, _action: &Action) -> Result<()> {
        Err(Error::BrowserClosed)
    }
}

/// An exclusive lease on one browser handle.
///
/// Return it with [`BrowserPool::release`]. A lease dropped without being
/// released discards its handle, since its state is unknown.
pub struct PooledBrowser {
    browser: Box<dyn Browser>,
    pool: Arc<BrowserPool>,
    released: bool,
    _permit: OwnedSemaphorePermit,
}

impl PooledBrowser {
    fn take(&mut self) -> Box<dyn Browser> {
        self.released = true;
        std::mem::replace(&mut self.browser, Box::new(Released))
    }
}

impl std::fmt::Debug for PooledBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBrowser")
            .field("browser", &self.browser.id())
            .field("released", &self.released)
            .finish()
    }
}

impl std::ops::Deref for PooledBrowser {
    type Target = dyn Browser;

    fn deref(&self) -> &Self::Target {
        self.browser.as_ref()
    }
}

impl std::ops::DerefMut for PooledBrowser {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.browser.as_mut()
    }
}

impl Drop for PooledBrowser {
    fn drop(&mut self) {
        let mut stats = self.pool.stats.write();
        stats.active = stats.active.saturating_sub(1);
        if !self.released {
            tracing::warn!(browser = self.browser.id(), "Lease dropped without release, discarding");
            stats.browsers_discarded += 1;
        }
    }
}

/// Fixed-capacity pool of browser handles
pub struct BrowserPool {
    factory: Arc<dyn BrowserFactory>,
    config: PoolConfig,
    semaphore: Arc<Semaphore>,
    idle: Mutex<Vec<Box<dyn Browser>>>,
    closed: AtomicBool,
    stats: RwLock<PoolStats>,
}

impl BrowserPool {
    /// Create a pool; no handle is created until first acquired
    pub fn new(factory: Arc<dyn BrowserFactory>, config: PoolConfig) -> Result<Arc<Self>> {
        if config.size == 0 {
            return Err(Error::config("browser pool size must be at least 1"));
        }

        Ok(Arc::new(Self {
            factory,
            semaphore: Arc::new(Semaphore::new(config.size)),
            config,
            idle: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            stats: RwLock::new(PoolStats::default()),
        }))
    }

    /// Lease a handle, waiting until one is free.
    ///
    /// Fails with [`Error::PoolClosed`] once the pool is shut down, and with
    /// [`Error::BrowserCreation`] when a replacement cannot be created.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledBrowser> {
        let start = Instant::now();

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::PoolClosed)?;

        if self.is_closed() {
            return Err(Error::PoolClosed);
        }

        self.stats.write().total_wait_ms += start.elapsed().as_millis() as u64;

        let reused = self.idle.lock().pop();
        let browser = match reused {
            Some(browser) => browser,
            None => self.create_with_retries().await?,
        };

        {
            let mut stats = self.stats.write();
            stats.leases += 1;
            stats.active += 1;
            if stats.active > stats.peak_active {
                stats.peak_active = stats.active;
            }
        }

        tracing::debug!(browser = browser.id(), "Leased browser");

        Ok(PooledBrowser {
            browser,
            pool: Arc::clone(self),
            released: false,
            _permit: permit,
        })
    }

    async fn create_with_retries(&self) -> Result<Box<dyn Browser>> {
        let attempts = self.config.creation_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.factory.create().await {
                Ok(browser) => {
                    self.stats.write().browsers_created += 1;
                    return Ok(browser);
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, error = %e, "Browser creation failed");
                    self.stats.write().creation_failures += 1;
                    last_error = e.to_string();
                    if attempt < attempts && !self.config.retry_backoff.is_zero() {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }

        Err(Error::BrowserCreation {
            attempts,
            reason: last_error,
        })
    }

    /// Return a lease.
    ///
    /// Healthy handles are reset and kept for reuse; a handle that is
    /// unhealthy, fails its reset, or comes back after shutdown is closed.
    pub async fn release(&self, mut lease: PooledBrowser, healthy: bool) {
        let mut browser = lease.take();

        let keep = healthy
            && !self.is_closed()
            && match tokio::time::timeout(self.config.reset_timeout, browser.reset()).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::warn!(browser = browser.id(), error = %e, "Browser reset failed");
                    false
                }
                Err(_) => {
                    tracing::warn!(browser = browser.id(), "Browser reset timed out");
                    false
                }
            };

        let rejected = if keep { self.park(browser) } else { Some(browser) };
        match rejected {
            None => self.stats.write().healthy_returns += 1,
            Some(mut browser) => {
                tracing::debug!(browser = browser.id(), healthy, "Discarding browser");
                browser.close().await;
                self.stats.write().browsers_discarded += 1;
            }
        }
        // Dropping the lease returns its permit after the handle is parked
        drop(lease);
    }

    /// Park a handle for reuse. Hands it back when the pool shut down
    /// while the handle was being reset.
    fn park(&self, browser: Box<dyn Browser>) -> Option<Box<dyn Browser>> {
        let mut idle = self.idle.lock();
        if self.is_closed() {
            return Some(browser);
        }
        idle.push(browser);
        None
    }

    /// Stop leasing and close every idle handle. Pending and future
    /// acquires fail with [`Error::PoolClosed`].
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.semaphore.close();

        let idle: Vec<_> = self.idle.lock().drain(..).collect();
        let count = idle.len() as u64;
        for mut browser in idle {
            browser.close().await;
        }
        self.stats.write().browsers_discarded += count;

        tracing::debug!(closed = count, "Browser pool shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.read().clone()
    }

    /// Configured number of concurrent leases
    pub fn size(&self) -> usize {
        self.config.size
    }

    /// Handles waiting for reuse
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Get current active lease count
    pub fn active(&self) -> u64 {
        self.stats.read().active
    }

    /// Get available permits
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("size", &self.config.size)
            .field("idle", &self.idle_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::testing::FakeApp;

    fn pool(app: &Arc<FakeApp>, size: usize) -> Arc<BrowserPool> {
        let config = PoolConfig::new(size)
            .creation_retries(2)
            .retry_backoff(Duration::ZERO);
        BrowserPool::new(Arc::new(app.factory()), config).unwrap()
    }

    #[test]
    fn test_pool_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.browsers_created, 0);
        assert_eq!(stats.active, 0);
    }

    #[test]
    fn test_zero_size_rejected() {
        let app = FakeApp::new();
        assert!(BrowserPool::new(Arc::new(app.factory()), PoolConfig::new(0)).is_err());
    }

    #[tokio::test]
    async fn test_healthy_release_reuses_handle() {
        let app = FakeApp::new();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        let first = lease.id().to_string();
        pool.release(lease, true).await;

        let lease = assert_ok!(pool.acquire().await);
        assert_eq!(lease.id(), first);
        pool.release(lease, true).await;

        let stats = pool.stats();
        assert_eq!(stats.browsers_created, 1);
        assert_eq!(stats.healthy_returns, 2);
        assert_eq!(app.resets(), 2);
    }

    #[tokio::test]
    async fn test_unhealthy_release_replaces_handle() {
        let app = FakeApp::new();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        let first = lease.id().to_string();
        pool.release(lease, false).await;
        assert_eq!(pool.available_permits(), 1);

        let lease = assert_ok!(pool.acquire().await);
        assert_ne!(lease.id(), first);
        pool.release(lease, true).await;

        let stats = pool.stats();
        assert_eq!(stats.browsers_created, 2);
        assert_eq!(stats.browsers_discarded, 1);
    }

    #[tokio::test]
    async fn test_dropped_lease_is_discarded() {
        let app = FakeApp::new();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        drop(lease);

        assert_eq!(pool.available_permits(), 1);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.stats().browsers_discarded, 1);
    }

    #[tokio::test]
    async fn test_creation_retries_then_succeeds() {
        let app = FakeApp::new();
        app.fail_next_creations(2);
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        pool.release(lease, true).await;
        assert_eq!(pool.stats().creation_failures, 2);
    }

    #[tokio::test]
    async fn test_creation_exhaustion_is_fatal() {
        let app = FakeApp::new();
        app.fail_next_creations(3);
        let pool = pool(&app, 1);

        let err = assert_err!(pool.acquire().await);
        assert!(err.is_fatal());
        assert!(matches!(err, Error::BrowserCreation { attempts: 3, .. }));
        // The permit is not lost
        assert_eq!(pool.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let app = FakeApp::new();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|l| l.id().to_string()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        let id = lease.id().to_string();
        pool.release(lease, true).await;
        let got = assert_ok!(waiter.await.unwrap());
        assert_eq!(got, id);
        assert_eq!(pool.stats().peak_active, 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_waiters() {
        let app = FakeApp::new();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.shutdown().await;
        let err = assert_err!(waiter.await.unwrap());
        assert!(matches!(err, Error::PoolClosed));

        // Returned after shutdown: closed, not parked
        pool.release(lease, true).await;
        assert_eq!(pool.idle_count(), 0);
        assert!(matches!(pool.acquire().await, Err(Error::PoolClosed)));
    }

    #[tokio::test]
    async fn test_shutdown_during_reset_closes_handle() {
        let app = FakeApp::new();
        let gate = app.hold_resets();
        let pool = pool(&app, 1);

        let lease = assert_ok!(pool.acquire().await);
        let releasing = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.release(lease, true).await })
        };

        app.reset_started().await;
        pool.shutdown().await;
        gate.notify_one();
        releasing.await.unwrap();

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(app.closed(), 1);
        assert_eq!(pool.stats().healthy_returns, 0);
        assert_eq!(pool.stats().browsers_discarded, 1);
    }
}
