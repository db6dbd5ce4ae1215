// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Link-based candidate selector

use std::collections::HashSet;

use url::Url;

use super::{hrefs, CandidateSelector};
use crate::state::{Action, Identification, Snapshot};

/// Proposes a click on every followable `<a href>` in the document
#[derive(Debug, Clone)]
pub struct AnchorSelector {
    /// Only propose links on the snapshot's host
    pub same_host_only: bool,
    /// Substrings that exclude a link (case-insensitive)
    pub exclude_patterns: Vec<String>,
    /// File extensions to skip
    pub skip_extensions: Vec<String>,
}

impl Default for AnchorSelector {
    fn default() -> Self {
        Self {
            same_host_only: true,
            exclude_patterns: vec![
                "logout".to_string(),
                "signout".to_string(),
                "delete".to_string(),
            ],
            skip_extensions: [
                "jpg", "jpeg", "png", "gif", "svg", "ico", "css", "js", "woff", "woff2", "pdf",
                "zip", "gz",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AnchorSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add exclude pattern
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Set same host only
    pub fn same_host_only(mut self, same_host: bool) -> Self {
        self.same_host_only = same_host;
        self
    }

    fn resolve(&self, href: &str, base: &Url) -> Option<Url> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("data:")
        {
            return None;
        }

        let mut url = base.join(href).ok()?;
        url.set_fragment(None);
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        Some(url)
    }

    fn should_follow(&self, url: &Url, base: &Url) -> bool {
        if self.same_host_only && url.host_str() != base.host_str() {
            return false;
        }

        let path = url.path().to_lowercase();
        if self
            .skip_extensions
            .iter()
            .any(|ext| path.ends_with(&format!(".{}", ext)))
        {
            return false;
        }

        let lower = url.as_str().to_lowercase();
        !self
            .exclude_patterns
            .iter()
            .any(|p| lower.contains(&p.to_lowercase()))
    }
}

impl CandidateSelector for AnchorSelector {
    fn candidates(&self, snapshot: &Snapshot) -> Vec<Action> {
        let base = match Url::parse(&snapshot.url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(url = %snapshot.url, error = %e, "Snapshot URL not parseable");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        hrefs(&snapshot.dom)
            .iter()
            .filter_map(|href| self.resolve(href, &base))
            .filter(|url| self.should_follow(url, &base))
            .filter(|url| seen.insert(url.to_string()))
            .map(|url| Action::click(Identification::href(url.to_string())))
            .collect()
    }
}
