// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Crawl configuration

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::browser::PoolConfig;
use crate::error::{Error, Result};

/// Order in which pending paths are handed to workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationOrder {
    /// Oldest pending path first
    #[default]
    BreadthFirst,
    /// Newest pending path first
    DepthFirst,
}

impl FromStr for ExplorationOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" | "breadth_first" | "breadth-first" => Ok(ExplorationOrder::BreadthFirst),
            "dfs" | "depth_first" | "depth-first" => Ok(ExplorationOrder::DepthFirst),
            other => Err(Error::config(format!("unknown exploration order '{}'", other))),
        }
    }
}

/// Crawl configuration. Durations are written in milliseconds in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Root URL of the application
    pub url: String,
    /// Hard cap on distinct states, root included
    pub max_states: Option<usize>,
    /// Cap on path length
    pub max_depth: Option<usize>,
    /// Wall-clock budget for the whole run
    #[serde(with = "millis_opt")]
    pub max_run_time: Option<Duration>,
    /// Browser pool size, and number of workers
    pub concurrent_browsers: usize,
    /// Upper bound on one browser call
    #[serde(with = "millis")]
    pub action_timeout: Duration,
    /// Settle time after firing an event
    #[serde(with = "millis")]
    pub wait_after_event: Duration,
    /// Settle time after loading the root URL
    #[serde(with = "millis")]
    pub wait_after_reload: Duration,
    /// Frontier discipline
    pub order: ExplorationOrder,
    /// Treat navigation to another host as a side effect, not a state
    pub stay_on_host: bool,
    /// Extra attempts when creating a browser handle fails
    pub browser_creation_retries: u32,
    /// Delay between creation attempts
    #[serde(with = "millis")]
    pub retry_backoff: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_states: None,
            max_depth: None,
            max_run_time: None,
            concurrent_browsers: 1,
            action_timeout: Duration::from_secs(30),
            wait_after_event: Duration::ZERO,
            wait_after_reload: Duration::ZERO,
            order: ExplorationOrder::BreadthFirst,
            stay_on_host: true,
            browser_creation_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl CrawlConfig {
    /// Create a config for a root URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults.
    ///
    /// The result is not validated, so a file may leave `url` to the caller.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set max states
    pub fn max_states(mut self, max: usize) -> Self {
        self.max_states = Some(max);
        self
    }

    /// Set max depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set the run-time budget
    pub fn max_run_time(mut self, budget: Duration) -> Self {
        self.max_run_time = Some(budget);
        self
    }

    /// Set pool size
    pub fn concurrent_browsers(mut self, n: usize) -> Self {
        self.concurrent_browsers = n;
        self
    }

    /// Set per-action timeout
    pub fn action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Set settle time after events
    pub fn wait_after_event(mut self, wait: Duration) -> Self {
        self.wait_after_event = wait;
        self
    }

    /// Set settle time after reloads
    pub fn wait_after_reload(mut self, wait: Duration) -> Self {
        self.wait_after_reload = wait;
        self
    }

    /// Set frontier order
    pub fn order(mut self, order: ExplorationOrder) -> Self {
        self.order = order;
        self
    }

    /// Set stay on host
    pub fn stay_on_host(mut self, stay: bool) -> Self {
        self.stay_on_host = stay;
        self
    }

    /// Set browser creation retry policy
    pub fn browser_creation_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.browser_creation_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// Check the config before a run
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)
            .map_err(|e| Error::config(format!("invalid root url '{}': {}", self.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!("unsupported scheme '{}'", url.scheme())));
        }
        if self.concurrent_browsers == 0 {
            return Err(Error::config("concurrent_browsers must be at least 1"));
        }
        if self.max_states == Some(0) {
            return Err(Error::config("max_states must be at least 1 (the root)"));
        }
        if self.action_timeout.is_zero() {
            return Err(Error::config("action_timeout must be positive"));
        }
        Ok(())
    }

    /// Pool settings derived from this config
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.concurrent_browsers)
            .creation_retries(self.browser_creation_retries)
            .retry_backoff(self.retry_backoff)
    }

    /// Host of the root URL
    pub fn root_host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_crawl_config() {
        let config = CrawlConfig::new("http://app.test/")
            .max_depth(3)
            .max_states(100)
            .concurrent_browsers(4)
            .order(ExplorationOrder::DepthFirst);

        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.max_states, Some(100));
        assert_eq!(config.pool_config().size, 4);
        assert!(config.validate().is_ok());
        assert_eq!(config.root_host().as_deref(), Some("app.test"));
    }

    #[test]
    fn test_validate_rejects() {
        assert!(CrawlConfig::new("not a url").validate().is_err());
        assert!(CrawlConfig::new("ftp://app.test/").validate().is_err());
        assert!(CrawlConfig::new("http://app.test/")
            .concurrent_browsers(0)
            .validate()
            .is_err());
        assert!(CrawlConfig::new("http://app.test/")
            .max_states(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_json_defaults_and_millis() {
        let config = CrawlConfig::from_json_str(
            r#"{"url": "http://app.test/", "max_run_time": 1500, "action_timeout": 250, "order": "depth_first"}"#,
        )
        .unwrap();

        assert_eq!(config.max_run_time, Some(Duration::from_millis(1500)));
        assert_eq!(config.action_timeout, Duration::from_millis(250));
        assert_eq!(config.order, ExplorationOrder::DepthFirst);
        assert_eq!(config.concurrent_browsers, 1);
        assert!(config.stay_on_host);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"url": "https://app.test/", "max_states": 5}}"#).unwrap();

        let config = CrawlConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.max_states, Some(5));
    }

    #[test]
    fn test_json_round_trip_keeps_durations() {
        let config = CrawlConfig::new("http://app.test/").max_run_time(Duration::from_secs(2));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"max_run_time\":2000"));
    }

    #[test]
    fn test_order_from_str() {
        assert_eq!("bfs".parse::<ExplorationOrder>().unwrap(), ExplorationOrder::BreadthFirst);
        assert_eq!("DFS".parse::<ExplorationOrder>().unwrap(), ExplorationOrder::DepthFirst);
        assert!("random".parse::<ExplorationOrder>().is_err());
    }
}
