// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! States and raw document snapshots

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::oracle::ComparisonKey;

/// Dense state identifier, assigned by the graph in discovery order.
/// The root state is always `StateId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl StateId {
    /// Identifier of the root (index) state
    pub const ROOT: StateId = StateId(0);

    /// Position of this state in the graph's state table
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state{}", self.0)
    }
}

/// Raw rendered document as reported by a browser handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// URL the browser was on when the snapshot was taken
    pub url: String,
    /// Serialized document content
    pub dom: String,
}

impl Snapshot {
    /// Create a new snapshot
    pub fn new(url: impl Into<String>, dom: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dom: dom.into(),
        }
    }
}

/// Everything needed to create a state except its identity.
///
/// Workers build a candidate for every observed document; the graph turns
/// at most one candidate per comparison key into a [`State`].
#[derive(Debug, Clone)]
pub struct StateCandidate {
    pub url: String,
    pub dom: Arc<str>,
    pub key: ComparisonKey,
    pub depth: usize,
}

impl StateCandidate {
    /// Build a candidate from a snapshot and its comparison key
    pub fn new(snapshot: Snapshot, key: ComparisonKey, depth: usize) -> Self {
        Self {
            url: snapshot.url,
            dom: Arc::from(snapshot.dom),
            key,
            depth,
        }
    }
}

/// A distinct, deduplicated application state. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct State {
    id: StateId,
    name: String,
    url: String,
    #[serde(skip)]
    key: ComparisonKey,
    dom: Arc<str>,
    depth: usize,
    discovered_at: DateTime<Utc>,
}

impl State {
    pub(crate) fn from_candidate(id: StateId, candidate: StateCandidate) -> Self {
        let name = if id == StateId::ROOT {
            "index".to_string()
        } else {
            id.to_string()
        };

        Self {
            id,
            name,
            url: candidate.url,
            key: candidate.key,
            dom: candidate.dom,
            depth: candidate.depth,
            discovered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    /// Human-readable label (`index` for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Normalized comparison key
    pub fn key(&self) -> &ComparisonKey {
        &self.key
    }

    /// Raw document content retained for reporting
    pub fn dom(&self) -> &str {
        &self.dom
    }

    /// Length of the path that discovered this state
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    pub fn is_root(&self) -> bool {
        self.id == StateId::ROOT
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_named_index() {
        let snapshot = Snapshot::new("http://app.test/", "<p>home</p>");
        let key = ComparisonKey::new("<p>home</p>");
        let root = State::from_candidate(StateId::ROOT, StateCandidate::new(snapshot, key, 0));

        assert!(root.is_root());
        assert_eq!(root.name(), "index");
        assert_eq!(root.dom(), "<p>home</p>");
    }

    #[test]
    fn test_state_name_follows_id() {
        let snapshot = Snapshot::new("http://app.test/a", "<p>a</p>");
        let state = State::from_candidate(
            StateId(4),
            StateCandidate::new(snapshot, ComparisonKey::new("<p>a</p>"), 2),
        );

        assert_eq!(state.name(), "state4");
        assert_eq!(state.depth(), 2);
        assert_eq!(state.to_string(), "state4 (http://app.test/a)");
    }
}
