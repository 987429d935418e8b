use crate::config::{validate_probe_settings, ConfigError};
use crate::error::MonitorError;
use crate::report::{self, Palette};
use pingwatch_model::{ProbeOutcome, Target};
use pingwatch_probe::{probe_all_with_progress, ProbeSettings, Prober};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub workers: usize,
    pub quiet: bool,
    pub summary: bool,
    pub show_progress: bool,
    pub palette: Palette,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            quiet: false,
            summary: true,
            show_progress: false,
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckSummary {
    /// Sorted by target address.
    pub results: Vec<(Target, ProbeOutcome)>,
    pub elapsed: Duration,
}

impl CheckSummary {
    pub fn alive_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| outcome.alive)
            .count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// 0 when every target answered, 1 when some did, 2 when none did.
    pub fn exit_code(&self) -> i32 {
        let alive = self.alive_count();
        if alive == self.total() {
            0
        } else if alive > 0 {
            1
        } else {
            2
        }
    }
}

/// Probes every target once and prints the results table.
pub fn run_check<P, W>(
    targets: &[Target],
    settings: &ProbeSettings,
    options: &CheckOptions,
    prober: &P,
    out: &mut W,
) -> Result<CheckSummary, MonitorError>
where
    P: Prober + ?Sized,
    W: Write + Send,
{
    if targets.is_empty() {
        return Err(ConfigError::NoTargets.into());
    }
    if options.workers == 0 {
        return Err(ConfigError::NonPositive("workers").into());
    }
    validate_probe_settings(settings)?;
    prober.check_available()?;

    let connections = options.workers.min(targets.len());
    if options.show_progress {
        writeln!(
            out,
            "Checking {} IP addresses with {} concurrent connections...",
            targets.len(),
            connections
        )?;
    } else {
        writeln!(out, "Checking {} IP address(es)...", targets.len())?;
        if targets.len() > 1 {
            writeln!(out, "Using {connections} concurrent connections")?;
        }
    }
    out.flush()?;

    let started = Instant::now();
    let shared = Mutex::new(&mut *out);
    let progress_error: Mutex<Option<io::Error>> = Mutex::new(None);
    let mut results = probe_all_with_progress(
        targets,
        settings,
        options.workers,
        prober,
        |done, total, target, outcome| {
            if !options.show_progress {
                return;
            }
            let line = report::progress_line(done, total, target, outcome.alive, &options.palette);
            let Ok(mut out) = shared.lock() else {
                return;
            };
            if let Err(err) = out.write_all(line.as_bytes()).and_then(|()| out.flush()) {
                debug!(error = %err, "progress line not written");
                if let Ok(mut slot) = progress_error.lock() {
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
            }
        },
    );
    let elapsed = started.elapsed();
    drop(shared);

    // The batch always runs to completion; the first failed write is reported after it.
    if let Some(err) = progress_error.into_inner().ok().flatten() {
        return Err(err.into());
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    let summary = CheckSummary { results, elapsed };

    if options.quiet {
        out.write_all(report::quiet_line(summary.alive_count(), summary.total()).as_bytes())?;
    } else {
        let table = report::check_table(&summary.results, options.summary, &options.palette);
        out.write_all(table.as_bytes())?;
    }
    writeln!(out, "\nCompleted in {:.2} seconds", elapsed.as_secs_f64())?;
    out.flush()?;

    Ok(summary)
}
