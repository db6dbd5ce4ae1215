// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the crawl engine
//!
//! Errors are grouped by how far they are allowed to travel. Replay and
//! action errors stay at the path boundary, resource and contract errors
//! terminate the run.

use thiserror::Error;

use crate::state::StateId;

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the crawl engine
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (reference browser)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Browser could not load a URL
    #[error("Navigation failed to {url}: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// The element an action targets is absent from the document
    #[error("Element not found for '{action}'")]
    ElementNotFound { action: String },

    /// Firing an event failed inside the browser
    #[error("Firing '{action}' failed: {reason}")]
    FireFailed { action: String, reason: String },

    /// The browser handle cannot express this action
    #[error("Unsupported action: {0}")]
    UnsupportedAction(String),

    /// Timeout error
    #[error("Operation timed out after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        url: Option<String>,
    },

    /// Replaying a path reached a different state than recorded
    #[error("Replay diverged at step {step}: expected {expected}, found {}", display_found(.found))]
    ReplayDiverged {
        step: usize,
        expected: StateId,
        found: Option<StateId>,
    },

    /// The browser pool was shut down while waiting for a handle
    #[error("Browser pool is closed")]
    PoolClosed,

    /// Creating a browser handle failed beyond the retry budget
    #[error("Browser creation failed after {attempts} attempts: {reason}")]
    BrowserCreation { attempts: u32, reason: String },

    /// Browser handle is unusable
    #[error("Browser has been closed")]
    BrowserClosed,

    /// A graph mutation would break uniqueness or connectivity
    #[error("State graph consistency violated: {0}")]
    GraphConsistency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn display_found(found: &Option<StateId>) -> String {
    match found {
        Some(id) => id.to_string(),
        None => "an unknown state".to_string(),
    }
}

/// How far an error may propagate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Browser handles cannot be provided; fatal to the run
    Resource,
    /// Navigation, missing element, timeout, divergence; abandons one path
    Replay,
    /// Internal invariant broken; fatal to the run
    Contract,
    /// Invalid configuration; rejected before the run starts
    Config,
    /// Anything else
    Other,
}

impl Error {
    /// Create a navigation error
    pub fn navigation_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NavigationFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an element-not-found error
    pub fn element_not_found(action: impl ToString) -> Self {
        Error::ElementNotFound {
            action: action.to_string(),
        }
    }

    /// Create a fire failure
    pub fn fire_failed(action: impl ToString, reason: impl Into<String>) -> Self {
        Error::FireFailed {
            action: action.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration_ms,
            url: None,
        }
    }

    /// Create a graph consistency error
    pub fn graph(msg: impl Into<String>) -> Self {
        Error::GraphConsistency(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_)
            | Error::Url(_)
            | Error::NavigationFailed { .. }
            | Error::ElementNotFound { .. }
            | Error::FireFailed { .. }
            | Error::UnsupportedAction(_)
            | Error::Timeout { .. }
            | Error::ReplayDiverged { .. }
            | Error::BrowserClosed => ErrorKind::Replay,
            Error::PoolClosed | Error::BrowserCreation { .. } => ErrorKind::Resource,
            Error::GraphConsistency(_) => ErrorKind::Contract,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) | Error::Serialization(_) | Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Check if this error must terminate the run
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Resource | ErrorKind::Contract)
    }

    /// Check if this error only abandons the current path
    pub fn is_recoverable(&self) -> bool {
        self.kind() == ErrorKind::Replay
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Check if the browser handle itself is suspect after this error
    pub fn taints_browser(&self) -> bool {
        matches!(self, Error::Http(_) | Error::BrowserClosed)
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::NavigationFailed { url, .. } => Some(url),
            Error::Timeout { url: Some(u), .. } => Some(u),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add URL context to error
    fn with_url(self, url: &str) -> Result<T>;

    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn with_url(self, url: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            Error::Timeout {
                operation,
                duration_ms,
                ..
            } => Error::Timeout {
                operation,
                duration_ms,
                url: Some(url.to_string()),
            },
            Error::NavigationFailed { reason, .. } => Error::NavigationFailed {
                url: url.to_string(),
                reason,
            },
            other => other,
        })
    }

    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            match err {
                // Keep the variant so classification survives
                Error::Other(inner) => Error::Other(format!("{}: {}", msg, inner)),
                other => other,
            }
        })
    }
}
