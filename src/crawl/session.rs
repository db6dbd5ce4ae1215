// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Shared context of one crawl run

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use url::Url;

use super::config::CrawlConfig;
use super::frontier::Frontier;
use super::stats::CrawlStats;
use crate::browser::BrowserPool;
use crate::candidate::CandidateSelector;
use crate::error::Error;
use crate::invariant::Invariant;
use crate::oracle::{ComparisonKey, StateComparator};
use crate::plugin::PluginRegistry;
use crate::state::{Snapshot, State, StateGraph};

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No pending or in-flight paths remained
    Exhausted,
    /// A new state would have exceeded `max_states`
    MaxStates,
    /// `max_run_time` elapsed
    MaxRunTime,
    /// Stopped from outside
    Cancelled,
    /// A fatal error ended the run
    Aborted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Exhausted => "exhausted",
            StopReason::MaxStates => "max states reached",
            StopReason::MaxRunTime => "max run time elapsed",
            StopReason::Cancelled => "cancelled",
            StopReason::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Cooperative stop flag. The first reason set wins.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    reason: Mutex<Option<StopReason>>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; returns `false` if a stop was already requested
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut current = self.reason.lock();
        if current.is_some() {
            return false;
        }
        *current = Some(reason);
        self.stopped.store(true, Ordering::SeqCst);
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.reason.lock()
    }
}

/// Pluggable collaborators a session explores with
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub comparator: Arc<dyn StateComparator>,
    pub selector: Arc<dyn CandidateSelector>,
    pub invariants: Vec<Invariant>,
    pub plugins: PluginRegistry,
}

/// Everything the workers of one run share
pub struct CrawlSession {
    config: CrawlConfig,
    graph: StateGraph,
    pool: Arc<BrowserPool>,
    frontier: Frontier,
    stats: CrawlStats,
    collaborators: Collaborators,
    stop: StopSignal,
    fatal: Mutex<Option<Error>>,
    root_host: Option<String>,
    started_at: DateTime<Utc>,
}

impl CrawlSession {
    pub(crate) fn new(
        config: CrawlConfig,
        graph: StateGraph,
        pool: Arc<BrowserPool>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            frontier: Frontier::new(config.order),
            root_host: config.root_host(),
            config,
            graph,
            pool,
            stats: CrawlStats::new(),
            collaborators,
            stop: StopSignal::new(),
            fatal: Mutex::new(None),
            started_at: Utc::now(),
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// The shared state graph
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn root(&self) -> Arc<State> {
        self.graph.root()
    }

    pub fn pool(&self) -> &Arc<BrowserPool> {
        &self.pool
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.collaborators.plugins
    }

    pub fn invariants(&self) -> &[Invariant] {
        &self.collaborators.invariants
    }

    pub fn selector(&self) -> &dyn CandidateSelector {
        self.collaborators.selector.as_ref()
    }

    /// Comparison key of a snapshot
    pub fn key_for(&self, snapshot: &Snapshot) -> ComparisonKey {
        self.collaborators.comparator.normalize(snapshot)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether `url` still belongs to the crawled application
    pub fn is_on_host(&self, url: &str) -> bool {
        if !self.config.stay_on_host {
            return true;
        }
        match (Url::parse(url), &self.root_host) {
            (Ok(url), Some(host)) => url.host_str() == Some(host.as_str()),
            _ => false,
        }
    }

    /// Request a stop and release waiting workers.
    ///
    /// In-flight paths notice the stop at their next step and drain.
    pub fn stop(&self, reason: StopReason) {
        if self.stop.stop(reason) {
            tracing::info!(reason = %reason, "Stopping crawl");
        }
        self.frontier.close();
    }

    /// Stop because of a fatal error; the first error is kept
    pub fn abort(&self, error: Error) {
        tracing::error!(error = %error, "Fatal error, aborting crawl");
        {
            let mut fatal = self.fatal.lock();
            if fatal.is_none() {
                *fatal = Some(error);
            }
        }
        self.stop(StopReason::Aborted);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop.reason()
    }

    pub(crate) fn take_fatal(&self) -> Option<Error> {
        self.fatal.lock().take()
    }
}

impl fmt::Debug for CrawlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlSession")
            .field("url", &self.config.url)
            .field("graph", &self.graph)
            .field("frontier", &self.frontier)
            .field("stop_reason", &self.stop_reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_stop_reason_wins() {
        let signal = StopSignal::new();
        assert!(!signal.is_stopped());

        assert!(signal.stop(StopReason::MaxStates));
        assert!(!signal.stop(StopReason::MaxRunTime));
        assert!(signal.is_stopped());
        assert_eq!(signal.reason(), Some(StopReason::MaxStates));
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::MaxRunTime.to_string(), "max run time elapsed");
        assert_eq!(
            serde_json::to_string(&StopReason::Exhausted).unwrap(),
            "\"exhausted\""
        );
    }
}
