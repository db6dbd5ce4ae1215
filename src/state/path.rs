// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Immutable exploration paths
//!
//! A path is a persistent singly-linked list of transitions ending at its
//! newest step. Extending shares the parent's nodes, so paths form a tree
//! rooted at the empty path and are never mutated after creation.

use std::fmt;
use std::sync::Arc;

use super::transition::Transition;
use super::vertex::StateId;

struct PathNode {
    transition: Arc<Transition>,
    parent: Option<Arc<PathNode>>,
    depth: usize,
}

/// Ordered transitions from the root state to the path's current state
#[derive(Clone, Default)]
pub struct Path {
    head: Option<Arc<PathNode>>,
}

impl Path {
    /// The empty path, positioned at the root state
    pub fn root() -> Self {
        Self::default()
    }

    /// Child path with one more step. The receiver is left untouched.
    pub fn extend(&self, transition: Arc<Transition>) -> Path {
        debug_assert_eq!(transition.source, self.target());
        Path {
            head: Some(Arc::new(PathNode {
                transition,
                parent: self.head.clone(),
                depth: self.depth() + 1,
            })),
        }
    }

    /// Number of transitions
    pub fn depth(&self) -> usize {
        self.head.as_ref().map_or(0, |n| n.depth)
    }

    pub fn is_root(&self) -> bool {
        self.head.is_none()
    }

    /// State this path claims to end at
    pub fn target(&self) -> StateId {
        self.head
            .as_ref()
            .map_or(StateId::ROOT, |n| n.transition.target)
    }

    /// Newest transition, if any
    pub fn last(&self) -> Option<&Arc<Transition>> {
        self.head.as_ref().map(|n| &n.transition)
    }

    /// Transitions in firing order, root first
    pub fn transitions(&self) -> Vec<Arc<Transition>> {
        let mut steps = Vec::with_capacity(self.depth());
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            steps.push(node.transition.clone());
            cursor = node.parent.as_ref();
        }
        steps.reverse();
        steps
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("depth", &self.depth())
            .field("target", &self.target())
            .finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", StateId::ROOT)?;
        for step in self.transitions() {
            write!(f, " -[{}]-> {}", step.action, step.target)?;
        }
        Ok(())
    }
}
