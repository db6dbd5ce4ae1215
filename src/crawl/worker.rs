// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Exploration worker
//!
//! A worker repeatedly takes a path from the frontier, leases a browser,
//! replays the path from the root, checks invariants, then fires every
//! candidate action of the reached state and records what each one leads
//! to. Anything that goes wrong inside a path abandons that path only;
//! resource and contract errors abort the whole session.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;

use super::frontier::Frontier;
use super::machine::PathMachine;
use super::session::{CrawlSession, StopReason};
use crate::browser::PooledBrowser;
use crate::error::{Error, Result};
use crate::plugin::{BrowserSideEffects, FireFailure};
use crate::state::{Action, Discovery, Path, Snapshot, StateCandidate};

/// How exploring one path ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Every candidate of the reached state was tried
    Explored { new_states: usize },
    /// Replay, a browser call or a fire timeout failed
    Abandoned { reason: String },
    /// An invariant failed at the reached state
    Violated { invariants: Vec<String> },
    /// The session stopped while the path was running
    Stopped,
}

/// One exploration loop bound to a session
pub struct ExplorationWorker {
    id: usize,
    session: Arc<CrawlSession>,
}

impl ExplorationWorker {
    pub fn new(id: usize, session: Arc<CrawlSession>) -> Self {
        Self { id, session }
    }

    /// Explore paths until the frontier is exhausted or closed
    pub async fn run(self) {
        tracing::debug!(worker = self.id, "Worker started");
        let frontier = self.session.frontier();

        while let Some(path) = frontier.next().await {
            let _done = Completion(frontier);
            let outcome = if self.session.is_stopped() {
                PathOutcome::Stopped
            } else {
                self.explore_contained(path).await
            };

            if outcome == PathOutcome::Stopped {
                break;
            }
        }

        tracing::debug!(worker = self.id, "Worker finished");
    }

    /// Explore one path, turning a panic in any collaborator into an
    /// abandoned path. The leased browser is dropped and so discarded.
    async fn explore_contained(&self, path: Path) -> PathOutcome {
        match AssertUnwindSafe(self.explore(path)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                self.session.stats().record_path_abandoned();
                tracing::error!(worker = self.id, panic = %reason, "Path exploration panicked");
                PathOutcome::Abandoned {
                    reason: format!("panicked: {}", reason),
                }
            }
        }
    }

    /// Explore one path with a leased browser
    pub async fn explore(&self, path: Path) -> PathOutcome {
        let stats = self.session.stats();
        stats.record_path_started();

        let mut browser = match self.session.pool().acquire().await {
            Ok(browser) => browser,
            Err(Error::PoolClosed) => return PathOutcome::Stopped,
            Err(e) => {
                self.session.abort(e);
                return PathOutcome::Stopped;
            }
        };

        let depth = path.depth();
        let mut machine = PathMachine::new(path, self.session.root());
        let result = self.explore_with(&mut browser, &mut machine).await;

        let healthy = match &result {
            Ok(_) => true,
            Err(e) => !e.taints_browser(),
        };
        self.session.pool().release(browser, healthy).await;

        match result {
            Ok(outcome) => {
                if let PathOutcome::Explored { new_states } = outcome {
                    stats.record_path_explored();
                    tracing::debug!(worker = self.id, depth, new_states, "Path explored");
                }
                outcome
            }
            Err(e) if e.is_fatal() => {
                self.session.abort(e);
                PathOutcome::Stopped
            }
            Err(e) => {
                if matches!(e, Error::ReplayDiverged { .. }) {
                    stats.record_divergence();
                }
                stats.record_path_abandoned();
                tracing::warn!(
                    worker = self.id,
                    depth,
                    path = %machine.path(),
                    error = %e,
                    "Abandoning path"
                );
                PathOutcome::Abandoned {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn explore_with(
        &self,
        browser: &mut PooledBrowser,
        machine: &mut PathMachine,
    ) -> Result<PathOutcome> {
        let session = &self.session;
        let config = session.config();

        let snapshot = self.replay(browser, machine).await?;
        if session.is_stopped() {
            return Ok(PathOutcome::Stopped);
        }

        let violations = machine.violations(&snapshot, session.invariants());
        if !violations.is_empty() {
            let mut names = Vec::with_capacity(violations.len());
            for violation in &violations {
                session.stats().record_violation();
                tracing::warn!(worker = self.id, state = %violation.state, "{}", violation);
                session.plugins().on_invariant_violation(session, violation);
                names.push(violation.invariant.clone());
            }
            return Ok(PathOutcome::Violated { invariants: names });
        }

        if config.max_depth.is_some_and(|max| machine.depth() >= max) {
            return Ok(PathOutcome::Explored { new_states: 0 });
        }

        let source = machine.current().clone();
        let candidates = session.selector().candidates(&snapshot);
        tracing::debug!(
            worker = self.id,
            state = %source.id(),
            candidates = candidates.len(),
            "Exploring state"
        );

        let mut at_source = true;
        let mut new_states = 0;

        for action in candidates {
            if session.is_stopped() {
                return Ok(PathOutcome::Stopped);
            }
            if session.graph().has_transition(source.id(), &action) {
                continue;
            }

            if !at_source {
                self.replay(browser, machine).await?;
            }

            match self.fire(browser, &action).await {
                Ok(()) => {}
                Err(e) if e.is_timeout() || e.taints_browser() => return Err(e),
                Err(e) => {
                    at_source = matches!(
                        e,
                        Error::ElementNotFound { .. } | Error::UnsupportedAction(_)
                    );
                    tracing::debug!(worker = self.id, action = %action, error = %e, "Fire failed");
                    let failure = FireFailure {
                        state: source.id(),
                        action: action.to_string(),
                        error: e.to_string(),
                    };
                    session.plugins().on_fire_event_failed(session, &failure);
                    continue;
                }
            }
            at_source = false;
            settle(config.wait_after_event).await;

            let after = self.snapshot(browser).await?;
            if !session.is_on_host(&after.url) {
                session.stats().record_side_effect();
                tracing::debug!(worker = self.id, action = %action, url = %after.url, "Left the application");
                let effects = BrowserSideEffects {
                    state: source.id(),
                    action: action.to_string(),
                    url_before: snapshot.url.clone(),
                    url_after: after.url,
                };
                session.plugins().on_browser_side_effects(session, &effects);
                continue;
            }

            let key = session.key_for(&after);
            if &key == source.key() {
                session.stats().record_unchanged();
                at_source = true;
                continue;
            }

            let candidate = StateCandidate::new(after, key, machine.depth() + 1);
            match session
                .graph()
                .discover(source.id(), action.clone(), candidate, config.max_states)?
            {
                Discovery::Recorded {
                    state,
                    is_new: true,
                    transition,
                } => {
                    new_states += 1;
                    session.stats().record_new_state();
                    tracing::info!(
                        worker = self.id,
                        state = %state.id(),
                        depth = state.depth(),
                        url = %state.url(),
                        "New state"
                    );
                    session.plugins().on_new_state(session, &state);
                    session.frontier().push(machine.extend(transition));
                }
                Discovery::Recorded { state, .. } => {
                    session.stats().record_revisit();
                    tracing::debug!(worker = self.id, from = %source.id(), to = %state.id(), action = %action, "Known state");
                    session.plugins().on_revisit_state(session, &state);
                }
                Discovery::Duplicate { existing } => {
                    tracing::debug!(worker = self.id, transition = %existing, "Transition already recorded");
                }
                Discovery::LimitReached => {
                    session.stop(StopReason::MaxStates);
                    return Ok(PathOutcome::Stopped);
                }
            }
        }

        Ok(PathOutcome::Explored { new_states })
    }

    /// Drive the browser from the root to the end of the machine's path
    async fn replay(&self, browser: &mut PooledBrowser, machine: &mut PathMachine) -> Result<Snapshot> {
        let session = &self.session;
        let config = session.config();
        session.stats().record_replay();
        machine.rewind();

        self.navigate(browser, &config.url).await?;
        settle(config.wait_after_reload).await;

        let mut snapshot = self.snapshot(browser).await?;
        let found = session.graph().state_by_key(&session.key_for(&snapshot));
        machine.verify_root(found.as_ref())?;

        while let Some(step) = machine.next_step().cloned() {
            self.fire(browser, &step.action).await?;
            settle(config.wait_after_event).await;

            snapshot = self.snapshot(browser).await?;
            let found = session.graph().state_by_key(&session.key_for(&snapshot));
            machine.advance(&step, found)?;
        }

        Ok(snapshot)
    }

    async fn navigate(&self, browser: &mut PooledBrowser, url: &str) -> Result<()> {
        let timeout = self.session.config().action_timeout;
        match tokio::time::timeout(timeout, browser.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(format!("navigate {}", url), timeout, Some(url))),
        }
    }

    async fn snapshot(&self, browser: &mut PooledBrowser) -> Result<Snapshot> {
        let timeout = self.session.config().action_timeout;
        match tokio::time::timeout(timeout, browser.snapshot()).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out("snapshot".to_string(), timeout, None)),
        }
    }

    async fn fire(&self, browser: &mut PooledBrowser, action: &Action) -> Result<()> {
        let timeout = self.session.config().action_timeout;
        let start = Instant::now();

        let result = match tokio::time::timeout(timeout, browser.fire(action)).await {
            Ok(result) => result,
            Err(_) => Err(self.timed_out(format!("fire {}", action), timeout, None)),
        };

        self.session
            .stats()
            .record_fire(start.elapsed().as_millis() as u64, result.is_ok());
        result
    }

    fn timed_out(&self, operation: String, timeout: Duration, url: Option<&str>) -> Error {
        self.session.stats().record_timeout();
        Error::Timeout {
            operation,
            duration_ms: timeout.as_millis() as u64,
            url: url.map(String::from),
        }
    }
}

/// Marks the taken path done on every exit from the loop body
struct Completion<'a>(&'a Frontier);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn settle(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}
