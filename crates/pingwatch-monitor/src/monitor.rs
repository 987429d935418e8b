use crate::cancel::{CancelToken, Sleeper, ThreadSleeper};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::report::{self, Palette};
use chrono::Local;
use pingwatch_model::{CycleResult, StatsTable};
use pingwatch_probe::{BatchPool, Prober};
use std::io::Write;
use tracing::{debug, info};

pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Round-robin monitoring session.
///
/// Probes the configured targets once per cycle, prints a status block, and
/// sleeps for the interval, until the cancel token fires. Counters live in a
/// [`StatsTable`] owned by [`Monitor::run`] and are only updated with complete
/// cycles.
pub struct Monitor<'a, P: Prober + ?Sized, S: Sleeper = ThreadSleeper> {
    config: MonitorConfig,
    prober: &'a P,
    pool: BatchPool,
    sleeper: S,
    palette: Palette,
    show_progress: bool,
    clock: fn() -> String,
}

impl<'a, P: Prober + ?Sized> Monitor<'a, P, ThreadSleeper> {
    pub fn new(config: MonitorConfig, prober: &'a P) -> Self {
        let pool = BatchPool::new(config.parallelism());
        Self {
            config,
            prober,
            pool,
            sleeper: ThreadSleeper,
            palette: Palette::default(),
            show_progress: false,
            clock: local_timestamp,
        }
    }
}

impl<'a, P: Prober + ?Sized, S: Sleeper> Monitor<'a, P, S> {
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Monitor<'a, P, T> {
        Monitor {
            config: self.config,
            prober: self.prober,
            pool: self.pool,
            sleeper,
            palette: self.palette,
            show_progress: self.show_progress,
            clock: self.clock,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Print a line per target as it is probed. Sequential mode only.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    /// Runs until `cancel` fires, then prints final statistics and returns
    /// the counters.
    pub fn run<W: Write>(
        &mut self,
        out: &mut W,
        cancel: &CancelToken,
    ) -> Result<StatsTable, MonitorError> {
        self.prober.check_available()?;

        let mut stats = StatsTable::new(self.config.targets());
        out.write_all(report::banner(&self.config).as_bytes())?;
        out.flush()?;

        let mut cycle: u64 = 0;
        while !cancel.is_cancelled() {
            cycle += 1;

            let Some(result) = self.run_cycle(cycle, out, cancel)? else {
                debug!(cycle, "discarding interrupted cycle");
                break;
            };
            stats.record_cycle(&result);

            let mut block = report::cycle_block(&result, &self.palette);
            if report::is_uptime_cycle(result.cycle) {
                block.push_str(&report::uptime_block(&stats));
            }
            block.push_str(&report::next_check_line(
                self.config.interval_secs(),
                result.cycle,
            ));
            out.write_all(block.as_bytes())?;
            out.flush()?;

            if !self.sleeper.sleep(self.config.interval(), cancel) {
                break;
            }
        }

        info!(cycles = stats.completed_cycles(), "monitoring stopped");
        out.write_all(report::stopped_line().as_bytes())?;
        out.write_all(report::final_statistics(&stats).as_bytes())?;
        out.flush()?;

        Ok(stats)
    }

    /// Probes every target once. `None` when cancelled part-way through.
    pub fn run_cycle<W: Write>(
        &self,
        cycle: u64,
        out: &mut W,
        cancel: &CancelToken,
    ) -> Result<Option<CycleResult>, MonitorError> {
        let timestamp = (self.clock)();
        let targets = self.config.targets();
        let settings = self.config.probe();

        if self.pool.workers() > 1 {
            let entries = self.pool.run_until(
                targets,
                settings,
                self.prober,
                || cancel.is_cancelled(),
                |_, _, _, _| {},
            );
            return Ok(match entries {
                Some(entries) if !cancel.is_cancelled() => Some(CycleResult {
                    cycle,
                    timestamp,
                    entries,
                }),
                _ => None,
            });
        }

        if self.show_progress {
            writeln!(out, "  Checking {} IP addresses...", targets.len())?;
        }

        let mut entries = Vec::with_capacity(targets.len());
        for (idx, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let outcome = self.prober.probe(target, settings);
            if self.show_progress {
                let line = report::progress_line(
                    idx + 1,
                    targets.len(),
                    target,
                    outcome.alive,
                    &self.palette,
                );
                out.write_all(line.as_bytes())?;
                out.flush()?;
            }
            entries.push((target.clone(), outcome));
        }

        // A signal that lands during the last probe also interrupts that probe.
        if cancel.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(CycleResult {
            cycle,
            timestamp,
            entries,
        }))
    }
}
