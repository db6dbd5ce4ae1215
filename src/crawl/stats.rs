// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Crawl counters and the end-of-run report

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;

use super::session::StopReason;
use crate::browser::PoolStats;

/// Counters updated by workers while a crawl runs
#[derive(Debug)]
pub struct CrawlStats {
    /// Paths taken from the frontier
    paths_started: AtomicU64,
    /// Paths whose candidates were all tried
    paths_explored: AtomicU64,
    /// Paths given up on replay, timeout or browser failure
    paths_abandoned: AtomicU64,
    /// Events fired, successful or not
    actions_fired: AtomicU64,
    /// Fire errors that did not end the path
    fire_failures: AtomicU64,
    /// Browser calls that exceeded the action timeout
    timeouts: AtomicU64,
    /// Path replays started
    replays: AtomicU64,
    /// Replays that reached an unexpected state
    replay_divergences: AtomicU64,
    /// Fired actions that created a state
    new_states: AtomicU64,
    /// Fired actions that led to a known state
    revisits: AtomicU64,
    /// Fired actions that left the DOM unchanged
    unchanged: AtomicU64,
    /// Invariant violations reported
    invariant_violations: AtomicU64,
    /// Off-host navigations
    side_effects: AtomicU64,
    start_time: Instant,
    fire_latencies: RwLock<Vec<u64>>,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self {
            paths_started: AtomicU64::new(0),
            paths_explored: AtomicU64::new(0),
            paths_abandoned: AtomicU64::new(0),
            actions_fired: AtomicU64::new(0),
            fire_failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            replays: AtomicU64::new(0),
            replay_divergences: AtomicU64::new(0),
            new_states: AtomicU64::new(0),
            revisits: AtomicU64::new(0),
            unchanged: AtomicU64::new(0),
            invariant_violations: AtomicU64::new(0),
            side_effects: AtomicU64::new(0),
            start_time: Instant::now(),
            fire_latencies: RwLock::new(Vec::new()),
        }
    }
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_path_started(&self) {
        self.paths_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_path_explored(&self) {
        self.paths_explored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_path_abandoned(&self) {
        self.paths_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one fired event and how long the browser took
    pub fn record_fire(&self, latency_ms: u64, success: bool) {
        self.actions_fired.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.fire_failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = self.fire_latencies.write();
        latencies.push(latency_ms);
        // Keep only the most recent latencies
        if latencies.len() > 10000 {
            latencies.drain(0..5000);
        }
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replay(&self) {
        self.replays.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_new_state(&self) {
        self.new_states.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_divergence(&self) {
        self.replay_divergences.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revisit(&self) {
        self.revisits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unchanged(&self) {
        self.unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_side_effect(&self) {
        self.side_effects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn paths_started(&self) -> u64 {
        self.paths_started.load(Ordering::Relaxed)
    }

    pub fn paths_abandoned(&self) -> u64 {
        self.paths_abandoned.load(Ordering::Relaxed)
    }

    /// Build the report for a finished run
    pub fn report(
        &self,
        states: usize,
        transitions: usize,
        stop_reason: StopReason,
        pool: PoolStats,
    ) -> CrawlReport {
        let latencies = self.fire_latencies.read();
        let (p50, p95) = percentiles(&latencies);

        CrawlReport {
            states,
            transitions,
            stop_reason,
            elapsed_ms: self.start_time.elapsed().as_millis() as u64,
            paths_started: self.paths_started.load(Ordering::Relaxed),
            paths_explored: self.paths_explored.load(Ordering::Relaxed),
            paths_abandoned: self.paths_abandoned.load(Ordering::Relaxed),
            actions_fired: self.actions_fired.load(Ordering::Relaxed),
            fire_failures: self.fire_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            replays: self.replays.load(Ordering::Relaxed),
            replay_divergences: self.replay_divergences.load(Ordering::Relaxed),
            new_states: self.new_states.load(Ordering::Relaxed),
            revisits: self.revisits.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
            side_effects: self.side_effects.load(Ordering::Relaxed),
            fire_p50_ms: p50,
            fire_p95_ms: p95,
            pool,
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub states: usize,
    pub transitions: usize,
    pub stop_reason: StopReason,
    pub elapsed_ms: u64,
    pub paths_started: u64,
    pub paths_explored: u64,
    pub paths_abandoned: u64,
    pub actions_fired: u64,
    pub fire_failures: u64,
    pub timeouts: u64,
    pub replays: u64,
    pub replay_divergences: u64,
    pub new_states: u64,
    pub revisits: u64,
    pub unchanged: u64,
    pub invariant_violations: u64,
    pub side_effects: u64,
    /// Fire latency percentiles
    pub fire_p50_ms: u64,
    pub fire_p95_ms: u64,
    pub pool: PoolStats,
}

impl std::fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "States:          {}", self.states)?;
        writeln!(f, "Transitions:     {}", self.transitions)?;
        writeln!(f, "Stop reason:     {}", self.stop_reason)?;
        writeln!(f, "Elapsed:         {}ms", self.elapsed_ms)?;
        writeln!(
            f,
            "Paths:           {} explored, {} abandoned",
            self.paths_explored, self.paths_abandoned
        )?;
        writeln!(
            f,
            "Actions fired:   {} ({} failed, {} timed out)",
            self.actions_fired, self.fire_failures, self.timeouts
        )?;
        writeln!(f, "Violations:      {}", self.invariant_violations)?;
        write!(
            f,
            "Browsers:        {} created, peak {} in use",
            self.pool.browsers_created, self.pool.peak_active
        )
    }
}

fn percentiles(latencies: &[u64]) -> (u64, u64) {
    if latencies.is_empty() {
        return (0, 0);
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_unstable();

    let len = sorted.len();
    let p50 = sorted[len / 2];
    let p95 = sorted[((len as f64 * 0.95) as usize).min(len - 1)];
    (p50, p95)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let stats = CrawlStats::new();
        stats.record_path_started();
        stats.record_path_explored();
        stats.record_fire(10, true);
        stats.record_fire(30, false);
        stats.record_timeout();

        let report = stats.report(3, 2, StopReason::Exhausted, PoolStats::default());
        assert_eq!(report.states, 3);
        assert_eq!(report.actions_fired, 2);
        assert_eq!(report.fire_failures, 1);
        assert_eq!(report.timeouts, 1);
        assert_eq!(report.fire_p50_ms, 30);
    }

    #[test]
    fn test_percentiles() {
        assert_eq!(percentiles(&[]), (0, 0));
        let values: Vec<u64> = (1..=100).collect();
        assert_eq!(percentiles(&values), (51, 96));
    }

    #[test]
    fn test_report_serializes() {
        let report = CrawlStats::new().report(1, 0, StopReason::MaxStates, PoolStats::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stop_reason"], "max_states");
        assert_eq!(json["pool"]["browsers_created"], 0);
    }
}
