// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Replay cursor over one exploration path
//!
//! A worker drives its browser from the root through the path's recorded
//! transitions. The machine tracks how far replay got and which state the
//! browser should be showing, and rejects any step that lands somewhere
//! other than the recorded target.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::invariant::{Invariant, InvariantViolation};
use crate::state::{Path, Snapshot, State, StateId, Transition};

/// Position of a browser along a path
#[derive(Debug, Clone)]
pub struct PathMachine {
    path: Path,
    steps: Vec<Arc<Transition>>,
    position: usize,
    root: Arc<State>,
    current: Arc<State>,
}

impl PathMachine {
    /// Start at the root, before any step is replayed
    pub fn new(path: Path, root: Arc<State>) -> Self {
        Self {
            steps: path.transitions(),
            path,
            position: 0,
            current: root.clone(),
            root,
        }
    }

    /// The path being replayed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// State the browser is expected to show
    pub fn current(&self) -> &Arc<State> {
        &self.current
    }

    /// Recorded transitions, root first
    pub fn transitions(&self) -> &[Arc<Transition>] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Steps replayed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Every step has been replayed
    pub fn is_complete(&self) -> bool {
        self.position == self.steps.len()
    }

    /// Next transition to replay, if any
    pub fn next_step(&self) -> Option<&Arc<Transition>> {
        self.steps.get(self.position)
    }

    /// Go back to the root for another replay
    pub fn rewind(&mut self) {
        self.position = 0;
        self.current = self.root.clone();
    }

    /// Check that the freshly loaded root matches the recorded root
    pub fn verify_root(&self, found: Option<&Arc<State>>) -> Result<()> {
        match found {
            Some(state) if state.id() == StateId::ROOT => Ok(()),
            other => Err(Error::ReplayDiverged {
                step: 0,
                expected: StateId::ROOT,
                found: other.map(|s| s.id()),
            }),
        }
    }

    /// Record that `transition` was replayed and the browser now shows `found`.
    ///
    /// Fails with [`Error::ReplayDiverged`] when `found` is not the recorded
    /// target, and with a graph error when `transition` is not the next step.
    pub fn advance(&mut self, transition: &Transition, found: Option<Arc<State>>) -> Result<()> {
        let expected = match self.next_step() {
            Some(step) if step.id == transition.id => step.target,
            _ => {
                return Err(Error::graph(format!(
                    "{} is not step {} of {}",
                    transition,
                    self.position + 1,
                    self.path
                )))
            }
        };

        match found {
            Some(state) if state.id() == expected => {
                self.position += 1;
                self.current = state;
                Ok(())
            }
            other => Err(Error::ReplayDiverged {
                step: self.position + 1,
                expected,
                found: other.map(|s| s.id()),
            }),
        }
    }

    /// Child path one step past this one; this path is left untouched
    pub fn extend(&self, transition: Arc<Transition>) -> Path {
        self.path.extend(transition)
    }

    /// Every invariant that fails on `snapshot`
    pub fn violations(&self, snapshot: &Snapshot, invariants: &[Invariant]) -> Vec<InvariantViolation> {
        invariants
            .iter()
            .filter(|inv| !inv.holds(snapshot))
            .map(|inv| InvariantViolation::new(inv, self.current.id(), snapshot, &self.path))
            .collect()
    }

    pub fn invariants_hold(&self, snapshot: &Snapshot, invariants: &[Invariant]) -> bool {
        invariants.iter().all(|inv| inv.holds(snapshot))
    }
}
