//! Console text for monitoring and checks.
//!
//! Every function here is a pure function of its arguments so a block can be
//! rendered again from the same cycle and counters with identical output.

use crate::config::MonitorConfig;
use crossterm::style::Stylize;
use pingwatch_model::{percent, CycleResult, ProbeOutcome, StatsTable, Target};
use std::fmt::Write;

const RULE_WIDTH: usize = 60;

/// Uptime is summarised on every cycle that is a multiple of this.
pub const UPTIME_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct Palette {
    pub color: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    fn marker(&self, alive: bool, width: usize) -> String {
        let text = if alive { "✓ ALIVE" } else { "✗ DEAD" };
        let padded = format!("{text:<width$}");
        match (self.color, alive) {
            (false, _) => padded,
            (true, true) => padded.green().to_string(),
            (true, false) => padded.red().to_string(),
        }
    }

    fn symbol(&self, alive: bool) -> String {
        let text = if alive { "✓" } else { "✗" };
        match (self.color, alive) {
            (false, _) => text.to_string(),
            (true, true) => text.green().to_string(),
            (true, false) => text.red().to_string(),
        }
    }
}

pub fn is_uptime_cycle(cycle: u64) -> bool {
    cycle > 0 && cycle % UPTIME_EVERY == 0
}

pub fn banner(config: &MonitorConfig) -> String {
    let probe = config.probe();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Starting round robin monitoring of {} IP addresses",
        config.targets().len()
    );
    let _ = writeln!(out, "Check interval: {} seconds", config.interval_secs());
    let _ = writeln!(
        out,
        "Ping timeout: {} seconds, Count: {}, Success: {}",
        probe.timeout_secs, probe.count, probe.policy
    );
    let _ = writeln!(out, "Press Ctrl+C to stop monitoring");
    out
}

pub fn cycle_block(result: &CycleResult, palette: &Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "[{}] Round Robin Check Results:", result.timestamp);
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for (target, outcome) in &result.entries {
        let _ = writeln!(
            out,
            "  {:<18} {} {}",
            target.as_str(),
            palette.marker(outcome.alive, 10),
            outcome.detail
        );
    }
    let _ = writeln!(
        out,
        "  Status: {}/{} alive ({}%)",
        result.alive_count(),
        result.total_targets(),
        result.alive_percent()
    );
    out
}

/// Cumulative uptime for every target probed at least once.
pub fn uptime_block(stats: &StatsTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Uptime Statistics (last {} checks):",
        stats.completed_cycles()
    );
    for entry in stats.iter() {
        if let Some(uptime) = entry.stats.uptime_percent() {
            let _ = writeln!(out, "    {}: {}% uptime", entry.target, uptime);
        }
    }
    let _ = writeln!(out);
    out
}

pub fn next_check_line(interval_secs: u64, cycle: u64) -> String {
    format!("  Next check in {interval_secs} seconds... (Check #{cycle})\n")
}

pub fn stopped_line() -> String {
    "\n\nMonitoring stopped by user\n".to_string()
}

pub fn final_statistics(stats: &StatsTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Final Statistics:");
    for entry in stats.iter() {
        if let Some(uptime) = entry.stats.uptime_percent() {
            let _ = writeln!(
                out,
                "  {}: {}/{} successful ({}% uptime)",
                entry.target, entry.stats.success_count, entry.stats.total_count, uptime
            );
        }
    }
    out
}

pub fn progress_line(
    done: usize,
    total: usize,
    target: &Target,
    alive: bool,
    palette: &Palette,
) -> String {
    format!("  [{done:3}/{total:3}] {} {target}\n", palette.symbol(alive))
}

/// Results table for a one-shot check, rows in the order given.
pub fn check_table(
    results: &[(Target, ProbeOutcome)],
    summary: bool,
    palette: &Palette,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{:<20} {:<10} Details", "IP Address", "Status");
    let _ = writeln!(out, "{rule}");

    for (target, outcome) in results {
        let _ = writeln!(
            out,
            "{:<20} {} {}",
            target.as_str(),
            palette.marker(outcome.alive, 10),
            outcome.detail
        );
    }

    if summary {
        let total = results.len();
        let alive = results.iter().filter(|(_, outcome)| outcome.alive).count();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "Summary: {alive}/{total} hosts alive, {}/{total} hosts unreachable",
            total - alive
        );
        let _ = writeln!(
            out,
            "Success rate: {}%",
            percent(alive as u64, total as u64).unwrap_or(0)
        );
    }
    out
}

pub fn quiet_line(alive: usize, total: usize) -> String {
    format!("Results: {alive}/{total} hosts alive\n")
}
