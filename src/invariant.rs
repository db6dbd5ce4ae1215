// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Invariants over rendered snapshots
//!
//! An invariant must hold at every visited state. A violation is reported
//! to plugins and ends exploration of that one path.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::state::{Path, Snapshot, StateId};

type Predicate = dyn Fn(&Snapshot) -> bool + Send + Sync;

/// Named predicate over a snapshot
#[derive(Clone)]
pub struct Invariant {
    name: String,
    description: String,
    predicate: Arc<Predicate>,
}

impl Invariant {
    /// Invariant from an arbitrary predicate
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Snapshot) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            predicate: Arc::new(predicate),
        }
    }

    /// Document must match `pattern`
    pub fn must_contain(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::config(e.to_string()))?;
        Ok(Self::new(name, move |s| regex.is_match(&s.dom))
            .describe(format!("document matches /{}/", pattern)))
    }

    /// Document must not match `pattern`
    pub fn must_not_contain(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::config(e.to_string()))?;
        Ok(Self::new(name, move |s| !regex.is_match(&s.dom))
            .describe(format!("document does not match /{}/", pattern)))
    }

    /// Set a longer description for reports
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate against a snapshot
    pub fn holds(&self, snapshot: &Snapshot) -> bool {
        (self.predicate)(snapshot)
    }
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// A failed invariant, as handed to plugins
#[derive(Debug, Clone, Serialize)]
pub struct InvariantViolation {
    pub invariant: String,
    pub description: String,
    pub state: StateId,
    pub url: String,
    /// Action sequence from the root, for reproduction
    pub path: Vec<String>,
}

impl InvariantViolation {
    pub fn new(invariant: &Invariant, state: StateId, snapshot: &Snapshot, path: &Path) -> Self {
        Self {
            invariant: invariant.name().to_string(),
            description: invariant.description().to_string(),
            state,
            url: snapshot.url.clone(),
            path: path
                .transitions()
                .iter()
                .map(|t| t.action.to_string())
                .collect(),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invariant '{}' violated at {} ({})",
            self.invariant, self.state, self.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_invariant() {
        let inv = Invariant::new("non-empty", |s: &Snapshot| !s.dom.is_empty());
        assert!(inv.holds(&Snapshot::new("http://app.test/", "<p/>")));
        assert!(!inv.holds(&Snapshot::new("http://app.test/", "")));
    }

    #[test]
    fn test_regex_invariants() {
        let no_errors = Invariant::must_not_contain("no-errors", r"(?i)stack trace|exception").unwrap();
        let has_nav = Invariant::must_contain("has-nav", r"<nav\b").unwrap();

        let ok = Snapshot::new("http://app.test/", "<nav></nav><p>fine</p>");
        let broken = Snapshot::new("http://app.test/", "<p>NullPointerException</p>");

        assert!(no_errors.holds(&ok));
        assert!(has_nav.holds(&ok));
        assert!(!no_errors.holds(&broken));
        assert!(!has_nav.holds(&broken));
        assert_eq!(no_errors.description(), "document does not match /(?i)stack trace|exception/");
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let err = Invariant::must_contain("bad", "[").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_violation_display() {
        let inv = Invariant::new("x", |_: &Snapshot| false);
        let snapshot = Snapshot::new("http://app.test/a", "");
        let violation = InvariantViolation::new(&inv, StateId(2), &snapshot, &Path::root());

        assert_eq!(
            violation.to_string(),
            "invariant 'x' violated at state2 (http://app.test/a)"
        );
        assert!(violation.path.is_empty());
    }
}
