//! Shared data structures for pingwatch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Address being monitored. Kept as the raw string the user supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Running counters for one target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetStats {
    pub success_count: u64,
    pub total_count: u64,
}

impl TargetStats {
    pub fn record(&mut self, alive: bool) {
        self.total_count += 1;
        if alive {
            self.success_count += 1;
        }
    }

    /// Truncating percentage of successful probes, `None` before the first probe.
    pub fn uptime_percent(&self) -> Option<u64> {
        percent(self.success_count, self.total_count)
    }
}

/// `floor(part * 100 / whole)`, `None` when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> Option<u64> {
    if whole == 0 {
        None
    } else {
        Some(part * 100 / whole)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeDetail {
    Alive,
    NotReachable,
    Timeout,
    Error(String),
}

impl fmt::Display for ProbeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeDetail::Alive => f.write_str("Alive"),
            ProbeDetail::NotReachable => f.write_str("Not reachable"),
            ProbeDetail::Timeout => f.write_str("Timeout"),
            ProbeDetail::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub alive: bool,
    pub detail: ProbeDetail,
}

impl ProbeOutcome {
    pub fn alive() -> Self {
        Self {
            alive: true,
            detail: ProbeDetail::Alive,
        }
    }

    pub fn not_reachable() -> Self {
        Self {
            alive: false,
            detail: ProbeDetail::NotReachable,
        }
    }

    pub fn timeout() -> Self {
        Self {
            alive: false,
            detail: ProbeDetail::Timeout,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            alive: false,
            detail: ProbeDetail::Error(message.into()),
        }
    }
}

/// Results of one pass over every target, in configured order.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleResult {
    pub cycle: u64,
    pub timestamp: String,
    pub entries: Vec<(Target, ProbeOutcome)>,
}

impl CycleResult {
    pub fn alive_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.alive)
            .count()
    }

    pub fn total_targets(&self) -> usize {
        self.entries.len()
    }

    pub fn alive_percent(&self) -> u64 {
        percent(self.alive_count() as u64, self.total_targets() as u64).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub target: Target,
    pub stats: TargetStats,
}

/// Per-target counters, iterated in the order the targets were configured.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    entries: Vec<TargetEntry>,
    index: HashMap<Target, usize>,
    cycles: u64,
}

impl StatsTable {
    /// Zeroed counters for every target. Repeated targets share one entry.
    pub fn new<'a>(targets: impl IntoIterator<Item = &'a Target>) -> Self {
        let mut table = Self::default();
        for target in targets {
            if table.index.contains_key(target) {
                continue;
            }
            table.index.insert(target.clone(), table.entries.len());
            table.entries.push(TargetEntry {
                target: target.clone(),
                stats: TargetStats::default(),
            });
        }
        table
    }

    /// Counts one probe of `target`; unknown targets are ignored.
    pub fn record(&mut self, target: &Target, alive: bool) {
        if let Some(&idx) = self.index.get(target) {
            self.entries[idx].stats.record(alive);
        }
    }

    /// Applies a complete cycle; targets unknown to the table are ignored.
    pub fn record_cycle(&mut self, result: &CycleResult) {
        for (target, outcome) in &result.entries {
            self.record(target, outcome.alive);
        }
        self.cycles += 1;
    }

    pub fn get(&self, target: &Target) -> Option<&TargetStats> {
        self.index.get(target).map(|&idx| &self.entries[idx].stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.cycles
    }

    pub fn to_report(&self, started_at_utc: String, finished_at_utc: String) -> FinalReport {
        FinalReport {
            version: 1,
            started_at_utc,
            finished_at_utc,
            cycles: self.cycles,
            targets: self
                .entries
                .iter()
                .filter(|entry| entry.stats.total_count > 0)
                .map(|entry| TargetReport {
                    target: entry.target.clone(),
                    success_count: entry.stats.success_count,
                    total_count: entry.stats.total_count,
                    uptime_percent: entry.stats.uptime_percent().unwrap_or(0),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalReport {
    pub version: u32,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub cycles: u64,
    pub targets: Vec<TargetReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetReport {
    pub target: Target,
    pub success_count: u64,
    pub total_count: u64,
    pub uptime_percent: u64,
}
