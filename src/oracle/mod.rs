// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! State equivalence oracle
//!
//! Maps a raw snapshot to the key the state graph deduplicates on. Two
//! snapshots with equal keys are treated as the same application state.

mod strip;

use std::fmt;
use std::sync::Arc;

use crate::state::Snapshot;

pub use strip::{
    AttributeStripper, CommentStripper, DateStripper, RegexStripper, ScriptStripper, Stripper,
    StrippingComparator, StyleStripper, WhitespaceStripper,
};

/// Normalized representation of a snapshot
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComparisonKey(Arc<str>);

impl ComparisonKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 48;
        if self.0.len() <= PREVIEW {
            write!(f, "ComparisonKey({:?})", &*self.0)
        } else {
            let mut end = PREVIEW;
            while !self.0.is_char_boundary(end) {
                end -= 1;
            }
            write!(f, "ComparisonKey({:?}.., {} bytes)", &self.0[..end], self.0.len())
        }
    }
}

/// Deterministic, side-effect-free snapshot normalization.
///
/// Implementations must return the same key for the same snapshot for the
/// whole run.
pub trait StateComparator: Send + Sync {
    fn normalize(&self, snapshot: &Snapshot) -> ComparisonKey;
}

/// Keys on the raw document, byte for byte
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactComparator;

impl StateComparator for ExactComparator {
    fn normalize(&self, snapshot: &Snapshot) -> ComparisonKey {
        ComparisonKey::new(snapshot.dom.as_str())
    }
}

impl<F> StateComparator for F
where
    F: Fn(&Snapshot) -> ComparisonKey + Send + Sync,
{
    fn normalize(&self, snapshot: &Snapshot) -> ComparisonKey {
        self(snapshot)
    }
}
