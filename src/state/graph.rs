// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Shared state-flow graph
//!
//! The graph is the single source of truth for deduplication. All mutations
//! go through one write lock, so an insert-or-get on a comparison key is
//! linearizable: concurrent callers presenting the same key agree on one
//! winning state. Readers take the read lock and only ever see fully
//! inserted states and edges whose endpoints exist.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use super::transition::{Action, Transition, TransitionId};
use super::vertex::{State, StateCandidate, StateId};
use crate::error::{Error, Result};
use crate::oracle::ComparisonKey;

/// Outcome of recording one fired action
#[derive(Debug, Clone)]
pub enum Discovery {
    /// A transition was recorded. `is_new` tells whether this call created
    /// the target state.
    Recorded {
        state: Arc<State>,
        is_new: bool,
        transition: Arc<Transition>,
    },
    /// `(source, action)` was already recorded; nothing changed
    Duplicate { existing: Arc<Transition> },
    /// The key is unknown and the state cap is reached; nothing changed
    LimitReached,
}

/// Serializable copy of the graph, handed to exporters
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub root: StateId,
    pub states: Vec<Arc<State>>,
    pub transitions: Vec<Arc<Transition>>,
}

impl GraphSnapshot {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Export as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Default)]
struct GraphInner {
    states: Vec<Arc<State>>,
    by_key: HashMap<ComparisonKey, StateId>,
    transitions: Vec<Arc<Transition>>,
    outgoing: Vec<Vec<TransitionId>>,
    fired: HashMap<(StateId, Action), TransitionId>,
}

impl GraphInner {
    fn get(&self, id: StateId) -> Option<&Arc<State>> {
        self.states.get(id.index())
    }

    fn insert(&mut self, candidate: StateCandidate) -> Arc<State> {
        let id = StateId(self.states.len() as u32);
        let key = candidate.key.clone();
        let state = Arc::new(State::from_candidate(id, candidate));

        self.states.push(state.clone());
        self.outgoing.push(Vec::new());
        self.by_key.insert(key, id);
        state
    }

    fn link(&mut self, source: StateId, target: StateId, action: Action) -> Arc<Transition> {
        let id = TransitionId(self.transitions.len() as u32);
        let transition = Arc::new(Transition {
            id,
            source,
            target,
            action: action.clone(),
        });

        self.transitions.push(transition.clone());
        self.outgoing[source.index()].push(id);
        self.fired.insert((source, action), id);
        transition
    }

    fn check_endpoint(&self, id: StateId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::graph(format!("{} does not exist", id)));
        }
        Ok(())
    }
}

/// Thread-safe directed multigraph of states and transitions
pub struct StateGraph {
    inner: RwLock<GraphInner>,
}

impl StateGraph {
    /// Create a graph holding only the root state
    pub fn new(root: StateCandidate) -> Self {
        let mut inner = GraphInner::default();
        inner.insert(root);
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Get the root state
    pub fn root(&self) -> Arc<State> {
        self.inner.read().states[StateId::ROOT.index()].clone()
    }

    /// Return the state for `key`, creating it from `candidate` if absent.
    ///
    /// The boolean is `true` only for the one caller that created the state.
    /// Callers are responsible for linking a new state with a transition;
    /// workers use [`StateGraph::discover`] which does both atomically.
    pub fn insert_or_get(&self, key: &ComparisonKey, candidate: StateCandidate) -> (Arc<State>, bool) {
        if let Some(state) = self.state_by_key(key) {
            return (state, false);
        }

        let mut inner = self.inner.write();
        // Re-check: another writer may have won between the locks
        if let Some(&id) = inner.by_key.get(key) {
            return (inner.states[id.index()].clone(), false);
        }

        debug_assert_eq!(&candidate.key, key);
        (inner.insert(candidate), true)
    }

    /// Record `source -[action]-> target`.
    ///
    /// Returns `Ok(None)` when `(source, action)` is already recorded.
    pub fn add_transition(
        &self,
        source: StateId,
        target: StateId,
        action: Action,
    ) -> Result<Option<Arc<Transition>>> {
        let mut inner = self.inner.write();
        inner.check_endpoint(source)?;
        inner.check_endpoint(target)?;

        if inner.fired.contains_key(&(source, action.clone())) {
            return Ok(None);
        }

        Ok(Some(inner.link(source, target, action)))
    }

    /// Record the result of firing `action` at `source`.
    ///
    /// Deduplicates the transition, resolves or creates the target state and
    /// links them under a single write lock, so a new state is never visible
    /// without the edge that reaches it. A new key is rejected once the graph
    /// holds `max_states` states.
    pub fn discover(
        &self,
        source: StateId,
        action: Action,
        candidate: StateCandidate,
        max_states: Option<usize>,
    ) -> Result<Discovery> {
        let mut inner = self.inner.write();
        inner.check_endpoint(source)?;

        if let Some(&existing) = inner.fired.get(&(source, action.clone())) {
            return Ok(Discovery::Duplicate {
                existing: inner.transitions[existing.0 as usize].clone(),
            });
        }

        let (state, is_new) = match inner.by_key.get(&candidate.key) {
            Some(&id) => (inner.states[id.index()].clone(), false),
            None => {
                if max_states.is_some_and(|max| inner.states.len() >= max) {
                    return Ok(Discovery::LimitReached);
                }
                (inner.insert(candidate), true)
            }
        };

        let transition = inner.link(source, state.id(), action);

        Ok(Discovery::Recorded {
            state,
            is_new,
            transition,
        })
    }

    /// Get a state by id
    pub fn state(&self, id: StateId) -> Option<Arc<State>> {
        self.inner.read().get(id).cloned()
    }

    /// Look up a state by comparison key without inserting
    pub fn state_by_key(&self, key: &ComparisonKey) -> Option<Arc<State>> {
        let inner = self.inner.read();
        inner.by_key.get(key).map(|id| inner.states[id.index()].clone())
    }

    /// Whether `action` has already been recorded out of `source`
    pub fn has_transition(&self, source: StateId, action: &Action) -> bool {
        self.inner.read().fired.contains_key(&(source, action.clone()))
    }

    /// Outgoing transitions of a state with their targets
    pub fn neighbors(&self, id: StateId) -> Vec<(Arc<Transition>, StateId)> {
        let inner = self.inner.read();
        inner
            .outgoing
            .get(id.index())
            .map(|edges| {
                edges
                    .iter()
                    .map(|t| {
                        let transition = inner.transitions[t.0 as usize].clone();
                        let target = transition.target;
                        (transition, target)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All states in discovery order
    pub fn states(&self) -> Vec<Arc<State>> {
        self.inner.read().states.clone()
    }

    /// All transitions in recording order
    pub fn transitions(&self) -> Vec<Arc<Transition>> {
        self.inner.read().transitions.clone()
    }

    pub fn state_count(&self) -> usize {
        self.inner.read().states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.inner.read().transitions.len()
    }

    /// States with no transition sequence from the root.
    ///
    /// Always empty for graphs built only through [`StateGraph::discover`].
    pub fn unreachable_states(&self) -> Vec<StateId> {
        let inner = self.inner.read();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([StateId::ROOT]);
        seen.insert(StateId::ROOT);

        while let Some(id) = queue.pop_front() {
            for t in &inner.outgoing[id.index()] {
                let target = inner.transitions[t.0 as usize].target;
                if seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        inner
            .states
            .iter()
            .map(|s| s.id())
            .filter(|id| !seen.contains(id))
            .collect()
    }

    /// Shortest transition sequence from `from` to `to` (breadth-first)
    pub fn shortest_path(&self, from: StateId, to: StateId) -> Option<Vec<Arc<Transition>>> {
        let inner = self.inner.read();
        inner.get(from)?;
        inner.get(to)?;
        if from == to {
            return Some(Vec::new());
        }

        let mut via: HashMap<StateId, TransitionId> = HashMap::new();
        let mut queue = VecDeque::from([from]);

        while let Some(id) = queue.pop_front() {
            for &t in &inner.outgoing[id.index()] {
                let target = inner.transitions[t.0 as usize].target;
                if target == from || via.contains_key(&target) {
                    continue;
                }
                via.insert(target, t);
                if target == to {
                    let mut steps = Vec::new();
                    let mut cursor = to;
                    while cursor != from {
                        let transition = inner.transitions[via[&cursor].0 as usize].clone();
                        cursor = transition.source;
                        steps.push(transition);
                    }
                    steps.reverse();
                    return Some(steps);
                }
                queue.push_back(target);
            }
        }

        None
    }

    /// Consistent copy of the whole graph
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.read();
        GraphSnapshot {
            root: StateId::ROOT,
            states: inner.states.clone(),
            transitions: inner.transitions.clone(),
        }
    }
}

impl std::fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("StateGraph")
            .field("states", &inner.states.len())
            .field("transitions", &inner.transitions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::state::{Identification, Snapshot};

    fn candidate(dom: &str, depth: usize) -> StateCandidate {
        StateCandidate::new(
            Snapshot::new(format!("http://app.test/{}", dom), dom),
            ComparisonKey::new(dom),
            depth,
        )
    }

    fn click(id: &str) -> Action {
        Action::click(Identification::id(id))
    }

    #[test]
    fn test_new_graph_has_root() {
        let graph = StateGraph::new(candidate("home", 0));
        assert_eq!(graph.state_count(), 1);
        assert_eq!(graph.root().id(), StateId::ROOT);
        assert_eq!(graph.transition_count(), 0);
    }

    #[test]
    fn test_insert_or_get_returns_existing() {
        let graph = StateGraph::new(candidate("home", 0));
        let key = ComparisonKey::new("a");

        let (first, is_new) = graph.insert_or_get(&key, candidate("a", 1));
        assert!(is_new);
        let (second, is_new) = graph.insert_or_get(&key, candidate("a", 3));
        assert!(!is_new);
        assert_eq!(first.id(), second.id());
        assert_eq!(second.depth(), 1);
    }

    #[test]
    fn test_concurrent_insert_or_get_creates_one_state() {
        let graph = Arc::new(StateGraph::new(candidate("home", 0)));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let graph = graph.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let key = ComparisonKey::new("shared");
                    graph.insert_or_get(&key, candidate("shared", 1))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|(_, is_new)| *is_new).count(), 1);
        let id = results[0].0.id();
        assert!(results.iter().all(|(s, _)| s.id() == id));
        assert_eq!(graph.state_count(), 2);
    }

    #[test]
    fn test_concurrent_discover_same_action_records_once() {
        let graph = Arc::new(StateGraph::new(candidate("home", 0)));
        let barrier = Arc::new(Barrier::new(6));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let graph = graph.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    graph
                        .discover(StateId::ROOT, click("a"), candidate("a", 1), None)
                        .unwrap()
                })
            })
            .collect();

        let recorded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|d| matches!(d, Discovery::Recorded { .. }))
            .count();

        assert_eq!(recorded, 1);
        assert_eq!(graph.transition_count(), 1);
        assert_eq!(graph.state_count(), 2);
    }

    #[test]
    fn test_two_actions_to_same_key() {
        let graph = StateGraph::new(candidate("home", 0));

        let a = graph
            .discover(StateId::ROOT, click("a"), candidate("k1", 1), None)
            .unwrap();
        let b = graph
            .discover(StateId::ROOT, click("b"), candidate("k1", 1), None)
            .unwrap();

        let (Discovery::Recorded { state: s1, is_new: true, .. }, Discovery::Recorded { state: s2, is_new: false, .. }) = (a, b) else {
            panic!("expected one new and one existing state");
        };
        assert_eq!(s1.id(), s2.id());
        assert_eq!(graph.state_count(), 2);
        assert_eq!(graph.transition_count(), 2);
        assert_eq!(graph.neighbors(StateId::ROOT).len(), 2);
    }

    #[test]
    fn test_add_transition_dedupes_source_action() {
        let graph = StateGraph::new(candidate("home", 0));
        let (a, _) = graph.insert_or_get(&ComparisonKey::new("a"), candidate("a", 1));
        let (b, _) = graph.insert_or_get(&ComparisonKey::new("b"), candidate("b", 1));

        assert!(graph.add_transition(StateId::ROOT, a.id(), click("x")).unwrap().is_some());
        assert!(graph.add_transition(StateId::ROOT, b.id(), click("x")).unwrap().is_none());
        assert_eq!(graph.transition_count(), 1);
        assert!(graph.has_transition(StateId::ROOT, &click("x")));
    }

    #[test]
    fn test_add_transition_rejects_dangling_endpoint() {
        let graph = StateGraph::new(candidate("home", 0));
        let err = graph
            .add_transition(StateId::ROOT, StateId(9), click("x"))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_discover_respects_state_cap() {
        let graph = StateGraph::new(candidate("home", 0));

        let outcome = graph
            .discover(StateId::ROOT, click("a"), candidate("a", 1), Some(1))
            .unwrap();
        assert!(matches!(outcome, Discovery::LimitReached));
        assert_eq!(graph.state_count(), 1);
        assert_eq!(graph.transition_count(), 0);

        // Edges into known states are still recorded at the cap
        let outcome = graph
            .discover(StateId::ROOT, click("self"), candidate("home", 1), Some(1))
            .unwrap();
        assert!(matches!(outcome, Discovery::Recorded { is_new: false, .. }));
    }

    #[test]
    fn test_reachability_and_shortest_path() {
        let graph = StateGraph::new(candidate("home", 0));
        graph.discover(StateId::ROOT, click("a"), candidate("a", 1), None).unwrap();
        graph.discover(StateId(1), click("b"), candidate("b", 2), None).unwrap();
        graph.discover(StateId::ROOT, click("c"), candidate("b", 1), None).unwrap();

        assert!(graph.unreachable_states().is_empty());

        let path = graph.shortest_path(StateId::ROOT, StateId(2)).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].action, click("c"));

        assert!(graph.shortest_path(StateId(2), StateId::ROOT).is_none());

        graph.insert_or_get(&ComparisonKey::new("orphan"), candidate("orphan", 1));
        assert_eq!(graph.unreachable_states(), vec![StateId(3)]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let graph = StateGraph::new(candidate("home", 0));
        graph.discover(StateId::ROOT, click("a"), candidate("a", 1), None).unwrap();

        let snapshot = graph.snapshot();
        assert_eq!(snapshot.state_count(), 2);
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"index\""));
        assert!(json.contains("\"click\""));
    }
}
