// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Crawl entry point
//!
//! Loads the root state, seeds the frontier with the empty path and runs
//! one exploration worker per pooled browser until the frontier is
//! exhausted or a stop condition fires.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use super::config::CrawlConfig;
use super::session::{Collaborators, CrawlSession, StopReason};
use super::stats::CrawlReport;
use super::worker::ExplorationWorker;
use crate::browser::{BrowserFactory, BrowserPool, HttpBrowserFactory, PooledBrowser};
use crate::candidate::{AnchorSelector, CandidateSelector};
use crate::error::{Error, ErrorContext, Result};
use crate::invariant::Invariant;
use crate::oracle::{StateComparator, StrippingComparator};
use crate::plugin::{Plugin, PluginRegistry};
use crate::state::{GraphSnapshot, Path, Snapshot, StateCandidate, StateGraph};

/// What a finished crawl hands back
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub graph: GraphSnapshot,
    pub report: CrawlReport,
    pub stop_reason: StopReason,
}

/// Builder for [`Crawler`]
pub struct CrawlerBuilder {
    config: CrawlConfig,
    factory: Option<Arc<dyn BrowserFactory>>,
    comparator: Option<Arc<dyn StateComparator>>,
    selector: Option<Arc<dyn CandidateSelector>>,
    invariants: Vec<Invariant>,
    plugins: PluginRegistry,
}

impl CrawlerBuilder {
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            config,
            factory: None,
            comparator: None,
            selector: None,
            invariants: Vec::new(),
            plugins: PluginRegistry::new(),
        }
    }

    /// Browser handles to explore with (default: [`HttpBrowserFactory`])
    pub fn browser_factory(mut self, factory: impl BrowserFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Candidate actions per state (default: [`AnchorSelector`])
    pub fn selector(mut self, selector: impl CandidateSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// State equivalence (default: [`StrippingComparator::default`])
    pub fn comparator(mut self, comparator: impl StateComparator + 'static) -> Self {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    /// Add an invariant checked at every visited state
    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    /// Add a plugin
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.register(Arc::new(plugin));
        self
    }

    /// Add a shared plugin, keeping a handle to it
    pub fn plugin_arc(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.register(plugin);
        self
    }

    pub fn build(self) -> Result<Crawler> {
        self.config.validate()?;

        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(HttpBrowserFactory::default()));

        Ok(Crawler {
            config: self.config,
            factory,
            collaborators: Collaborators {
                comparator: self
                    .comparator
                    .unwrap_or_else(|| Arc::new(StrippingComparator::default())),
                selector: self
                    .selector
                    .unwrap_or_else(|| Arc::new(AnchorSelector::default())),
                invariants: self.invariants,
                plugins: self.plugins,
            },
        })
    }
}

/// Concurrent state-flow crawler
pub struct Crawler {
    config: CrawlConfig,
    factory: Arc<dyn BrowserFactory>,
    collaborators: Collaborators,
}

impl Crawler {
    pub fn builder(config: CrawlConfig) -> CrawlerBuilder {
        CrawlerBuilder::new(config)
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Run one crawl to completion.
    ///
    /// Returns the graph even when a limit stopped the run; a fatal error
    /// is returned only after in-flight paths drained and every browser
    /// was released.
    pub async fn run(&self) -> Result<CrawlResult> {
        let config = &self.config;
        let plugins = &self.collaborators.plugins;
        tracing::info!(
            url = %config.url,
            browsers = config.concurrent_browsers,
            order = ?config.order,
            "Starting crawl"
        );

        plugins.pre_crawling(config);

        let pool = BrowserPool::new(self.factory.clone(), config.pool_config())?;
        let root = match self.load_root(&pool).await {
            Ok(root) => root,
            Err(e) => {
                pool.shutdown().await;
                return Err(e);
            }
        };

        let key = self.collaborators.comparator.normalize(&root);
        let graph = StateGraph::new(StateCandidate::new(root, key, 0));
        let session = Arc::new(CrawlSession::new(
            config.clone(),
            graph,
            pool.clone(),
            self.collaborators.clone(),
        ));

        let root_state = session.root();
        tracing::info!(state = %root_state.id(), url = %root_state.url(), "Root state loaded");
        plugins.on_new_state(&session, &root_state);
        session.frontier().push(Path::root());

        let timer = config.max_run_time.map(|budget| {
            let session = session.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                session.stop(StopReason::MaxRunTime);
            })
        });

        let workers = (0..config.concurrent_browsers).map(|id| {
            let worker = ExplorationWorker::new(id, session.clone());
            tokio::spawn(worker.run())
        });
        for joined in join_all(workers).await {
            if let Err(e) = joined {
                session.abort(Error::other(format!("worker task failed: {}", e)));
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        pool.shutdown().await;

        let stop_reason = session.stop_reason().unwrap_or(StopReason::Exhausted);
        let graph = session.graph().snapshot();
        let report = session.stats().report(
            graph.state_count(),
            graph.transition_count(),
            stop_reason,
            pool.stats(),
        );

        tracing::info!(
            states = report.states,
            transitions = report.transitions,
            reason = %stop_reason,
            elapsed_ms = report.elapsed_ms,
            "Crawl finished"
        );
        plugins.post_crawling(&session, &report);

        if let Some(error) = session.take_fatal() {
            return Err(error);
        }

        Ok(CrawlResult {
            graph,
            report,
            stop_reason,
        })
    }

    /// Snapshot of the root URL with a freshly leased browser
    async fn load_root(&self, pool: &Arc<BrowserPool>) -> Result<Snapshot> {
        let mut browser = pool.acquire().await?;
        let result = self.load_root_with(&mut browser).await;
        let healthy = result.as_ref().map_or_else(|e| !e.taints_browser(), |_| true);
        pool.release(browser, healthy).await;
        result
    }

    async fn load_root_with(&self, browser: &mut PooledBrowser) -> Result<Snapshot> {
        let config = &self.config;
        let timeout = config.action_timeout;
        let timed_out = || Error::timeout("load root", timeout.as_millis() as u64);

        tokio::time::timeout(timeout, browser.navigate(&config.url))
            .await
            .map_err(|_| timed_out())?
            .with_url(&config.url)?;
        if !config.wait_after_reload.is_zero() {
            tokio::time::sleep(config.wait_after_reload).await;
        }
        tokio::time::timeout(timeout, browser.snapshot())
            .await
            .map_err(|_| timed_out())?
    }
}
