// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! State-flow model
//!
//! States, the actions that connect them, the shared graph that
//! deduplicates them, and the immutable paths workers replay.

mod graph;
mod path;
mod transition;
mod vertex;

pub use graph::{Discovery, GraphSnapshot, StateGraph};
pub use path::Path;
pub use transition::{Action, EventKind, How, Identification, Transition, TransitionId};
pub use vertex::{Snapshot, State, StateCandidate, StateId};
