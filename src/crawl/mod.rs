// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Concurrent exploration engine
//!
//! - [`Crawler`] runs a crawl and returns a [`CrawlResult`]
//! - [`CrawlSession`] is the state shared by all workers of one run
//! - [`ExplorationWorker`] replays and extends one path at a time
//! - [`Frontier`] holds the paths waiting for a worker

mod config;
mod crawler;
mod frontier;
mod machine;
mod session;
mod stats;
mod worker;

pub use config::{CrawlConfig, ExplorationOrder};
pub use crawler::{CrawlResult, Crawler, CrawlerBuilder};
pub use frontier::Frontier;
pub use machine::PathMachine;
pub use session::{CrawlSession, StopReason, StopSignal};
pub use stats::{CrawlReport, CrawlStats};
pub use worker::{ExplorationWorker, PathOutcome};
