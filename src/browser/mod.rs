// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser handles and the pool that leases them
//!
//! The engine drives a browser only through the [`Browser`] trait. Any call
//! may fail or hang; callers bound every call with a timeout and treat
//! failures as path-level errors.

mod config;
mod http;
mod pool;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{Action, Snapshot};

pub use config::BrowserConfig;
pub use http::{HttpBrowser, HttpBrowserFactory};
pub use pool::{BrowserPool, PoolConfig, PoolStats, PooledBrowser};

/// One live, stateful automation session
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle identifier, for logging
    fn id(&self) -> &str;

    /// Load a URL, replacing the current document
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Current rendered document and URL
    async fn snapshot(&mut self) -> Result<Snapshot>;

    /// Fire an event on the current document
    async fn fire(&mut self, action: &Action) -> Result<()>;

    /// Bring the handle back to a known-clean state (cookies, storage)
    async fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release underlying resources
    async fn close(&mut self) {}
}

/// Creates browser handles for the pool
#[async_trait]
pub trait BrowserFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn Browser>>;
}
