// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # crawlgraph - Concurrent State-Flow Crawler
//!
//! Explores a dynamic web application as an unknown state machine: fires
//! user events, records the rendered documents, and builds a directed
//! multigraph of deduplicated states and the transitions between them.
//!
//! ## Features
//!
//! - Shared state graph: one state per comparison key, even under
//!   concurrent discovery
//! - Browser pool: bounded, lazily created, reset-and-reuse handles
//! - Path replay: every path is replayed from the root and checked step
//!   by step before it is extended
//! - Limits: max states, max depth, max run time, per-action timeouts
//! - Invariants checked at every visited state
//! - Plugins observing new states, revisits, failures and side effects
//! - Reference HTTP browser and link selector for server-rendered apps
//!
//! ## Example
//!
//! ```rust,no_run
//! use crawlgraph::{CrawlConfig, Crawler, Invariant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlConfig::new("https://example.com")
//!         .concurrent_browsers(4)
//!         .max_states(200);
//!
//!     let crawler = Crawler::builder(config)
//!         .invariant(Invariant::must_not_contain("no-stack-traces", r"(?i)stack trace")?)
//!         .build()?;
//!
//!     let result = crawler.run().await?;
//!     println!("{} states, {} transitions", result.graph.state_count(), result.graph.transition_count());
//!
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod candidate;
pub mod crawl;
pub mod error;
pub mod invariant;
pub mod oracle;
pub mod plugin;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience

// Engine
pub use crawl::{
    CrawlConfig, CrawlReport, CrawlResult, CrawlSession, CrawlStats, Crawler, CrawlerBuilder,
    ExplorationOrder, ExplorationWorker, Frontier, PathMachine, PathOutcome, StopReason,
    StopSignal,
};

// Browsers
pub use browser::{
    Browser, BrowserConfig, BrowserFactory, BrowserPool, HttpBrowser, HttpBrowserFactory,
    PoolConfig, PoolStats, PooledBrowser,
};

// State model
pub use state::{
    Action, Discovery, EventKind, GraphSnapshot, How, Identification, Path, Snapshot, State,
    StateCandidate, StateGraph, StateId, Transition, TransitionId,
};

// Equivalence
pub use oracle::{ComparisonKey, ExactComparator, StateComparator, StrippingComparator};

// Candidates, invariants, plugins
pub use candidate::{AnchorSelector, CandidateSelector};
pub use invariant::{Invariant, InvariantViolation};
pub use plugin::{BrowserSideEffects, FireFailure, Plugin, PluginRegistry};

// Errors
pub use error::{Error, ErrorContext, ErrorKind, Result};

/// crawlgraph version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
