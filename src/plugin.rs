// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Extension points
//!
//! Plugins observe the crawl through a fixed set of synchronous hooks,
//! invoked on the worker that produced the event. Every hook has an empty
//! default, so a plugin implements only what it needs. Hooks receive the
//! session and may read the graph; no engine lock is held while they run.
//!
//! # Example
//!
//! ```rust,no_run
//! use crawlgraph::{CrawlSession, Plugin, State};
//!
//! struct PrintNewStates;
//!
//! impl Plugin for PrintNewStates {
//!     fn name(&self) -> &str {
//!         "print-new-states"
//!     }
//!
//!     fn on_new_state(&self, session: &CrawlSession, state: &State) {
//!         println!("{} (total {})", state, session.graph().state_count());
//!     }
//! }
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;

use crate::crawl::{CrawlConfig, CrawlReport, CrawlSession};
use crate::invariant::InvariantViolation;
use crate::state::{State, StateId};

/// A fired action that failed without ending the path
#[derive(Debug, Clone, Serialize)]
pub struct FireFailure {
    pub state: StateId,
    pub action: String,
    pub error: String,
}

/// The browser left the application while firing an action
#[derive(Debug, Clone, Serialize)]
pub struct BrowserSideEffects {
    pub state: StateId,
    pub action: String,
    pub url_before: String,
    pub url_after: String,
}

/// Crawl observer
#[allow(unused_variables)]
pub trait Plugin: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Before any browser is created
    fn pre_crawling(&self, config: &CrawlConfig) {}

    /// A state was created (also called once for the root)
    fn on_new_state(&self, session: &CrawlSession, state: &State) {}

    /// A fired action led to an already known state
    fn on_revisit_state(&self, session: &CrawlSession, state: &State) {}

    /// An invariant failed; the path is abandoned after this returns
    fn on_invariant_violation(&self, session: &CrawlSession, violation: &InvariantViolation) {}

    /// Firing an action failed
    fn on_fire_event_failed(&self, session: &CrawlSession, failure: &FireFailure) {}

    /// Firing an action navigated away from the application
    fn on_browser_side_effects(&self, session: &CrawlSession, effects: &BrowserSideEffects) {}

    /// After all workers drained, before the session is torn down
    fn post_crawling(&self, session: &CrawlSession, report: &CrawlReport) {}
}

/// Ordered set of plugins with panic-contained dispatch
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn dispatch(&self, hook: &str, f: impl Fn(&dyn Plugin)) {
        for plugin in &self.plugins {
            if catch_unwind(AssertUnwindSafe(|| f(plugin.as_ref()))).is_err() {
                tracing::error!(plugin = plugin.name(), hook, "Plugin panicked");
            }
        }
    }

    pub fn pre_crawling(&self, config: &CrawlConfig) {
        self.dispatch("pre_crawling", |p| p.pre_crawling(config));
    }

    pub fn on_new_state(&self, session: &CrawlSession, state: &State) {
        self.dispatch("on_new_state", |p| p.on_new_state(session, state));
    }

    pub fn on_revisit_state(&self, session: &CrawlSession, state: &State) {
        self.dispatch("on_revisit_state", |p| p.on_revisit_state(session, state));
    }

    pub fn on_invariant_violation(&self, session: &CrawlSession, violation: &InvariantViolation) {
        self.dispatch("on_invariant_violation", |p| {
            p.on_invariant_violation(session, violation)
        });
    }

    pub fn on_fire_event_failed(&self, session: &CrawlSession, failure: &FireFailure) {
        self.dispatch("on_fire_event_failed", |p| p.on_fire_event_failed(session, failure));
    }

    pub fn on_browser_side_effects(&self, session: &CrawlSession, effects: &BrowserSideEffects) {
        self.dispatch("on_browser_side_effects", |p| {
            p.on_browser_side_effects(session, effects)
        });
    }

    pub fn post_crawling(&self, session: &CrawlSession, report: &CrawlReport) {
        self.dispatch("post_crawling", |p| p.post_crawling(session, report));
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting(AtomicUsize);

    impl Plugin for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn pre_crawling(&self, _config: &CrawlConfig) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicking;

    impl Plugin for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn pre_crawling(&self, _config: &CrawlConfig) {
            panic!("plugin bug");
        }
    }

    #[test]
    fn test_panicking_plugin_does_not_stop_dispatch() {
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(Panicking));
        registry.register(counting.clone());

        registry.pre_crawling(&CrawlConfig::new("http://app.test/"));

        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2);
    }
}
