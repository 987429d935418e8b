use crate::error::ProbeError;
use crate::parser::parse_ping_summary;
use crate::process::run_with_deadline;
use pingwatch_model::{ProbeOutcome, Target};
use rayon::prelude::*;
use std::fmt;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Slack added on top of the per-packet timeouts before the process is killed.
const DEADLINE_SLACK_SECS: u64 = 5;

/// How the answers to `count` echo requests decide whether a target is alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// At least one reply arrived.
    #[default]
    Any,
    /// Every request was answered.
    All,
}

impl fmt::Display for SuccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuccessPolicy::Any => f.write_str("any"),
            SuccessPolicy::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
    pub count: u32,
    pub policy: SuccessPolicy,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 3,
            count: 1,
            policy: SuccessPolicy::Any,
        }
    }
}

impl ProbeSettings {
    pub fn deadline(&self) -> Duration {
        let budget = self.timeout_secs.saturating_mul(u64::from(self.count.max(1)));
        Duration::from_secs(budget.saturating_add(DEADLINE_SLACK_SECS))
    }
}

/// Decides whether a single target answers. Failures are outcomes, not errors.
pub trait Prober: Send + Sync {
    fn probe(&self, target: &Target, settings: &ProbeSettings) -> ProbeOutcome;

    /// Fails when the underlying mechanism is missing from the host.
    fn check_available(&self) -> Result<(), ProbeError> {
        Ok(())
    }
}

/// Shells out to the platform `ping`.
#[derive(Debug, Clone)]
pub struct SystemPingProber {
    program: String,
}

impl Default for SystemPingProber {
    fn default() -> Self {
        Self::new("ping")
    }
}

impl SystemPingProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Prober for SystemPingProber {
    fn probe(&self, target: &Target, settings: &ProbeSettings) -> ProbeOutcome {
        let mut command = Command::new(&self.program);
        command.args(ping_args(target.as_str(), settings, cfg!(windows)));

        let output = match run_with_deadline(&mut command, settings.deadline()) {
            Ok(output) => output,
            Err(err) => {
                warn!(host = %target, error = %err, "ping could not be run");
                return ProbeOutcome::error(err.to_string());
            }
        };

        if output.timed_out() {
            debug!(host = %target, "ping exceeded its deadline");
            return ProbeOutcome::timeout();
        }

        let alive = output.success()
            && match settings.policy {
                SuccessPolicy::Any => true,
                SuccessPolicy::All => parse_ping_summary(&output.stdout)
                    .map(|summary| summary.satisfies(SuccessPolicy::All))
                    .unwrap_or(true),
            };

        if alive {
            ProbeOutcome::alive()
        } else {
            ProbeOutcome::not_reachable()
        }
    }

    fn check_available(&self) -> Result<(), ProbeError> {
        ensure_ping_available(self)
    }
}

/// Command-line arguments for `ping`; Windows takes the timeout in milliseconds.
pub fn ping_args(target: &str, settings: &ProbeSettings, windows: bool) -> Vec<String> {
    if windows {
        vec![
            "-n".to_string(),
            settings.count.to_string(),
            "-w".to_string(),
            settings.timeout_secs.saturating_mul(1000).to_string(),
            target.to_string(),
        ]
    } else {
        vec![
            "-c".to_string(),
            settings.count.to_string(),
            "-W".to_string(),
            settings.timeout_secs.to_string(),
            target.to_string(),
        ]
    }
}

/// Checks that `prober`'s program can be executed at all.
pub fn ensure_ping_available(prober: &SystemPingProber) -> Result<(), ProbeError> {
    let help_flag = if cfg!(windows) { "/?" } else { "-h" };
    Command::new(prober.program())
        .arg(help_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|_| ())
        .map_err(|source| ProbeError::Unavailable {
            program: prober.program().to_string(),
            source,
        })
}

pub fn probe_all<P: Prober + ?Sized>(
    targets: &[Target],
    settings: &ProbeSettings,
    workers: usize,
    prober: &P,
) -> Vec<(Target, ProbeOutcome)> {
    probe_all_with_progress(targets, settings, workers, prober, |_, _, _, _| {})
}

/// One-shot batch on a pool sized for `workers`. See [`BatchPool::run_until`].
pub fn probe_all_with_progress<P, F>(
    targets: &[Target],
    settings: &ProbeSettings,
    workers: usize,
    prober: &P,
    on_done: F,
) -> Vec<(Target, ProbeOutcome)>
where
    P: Prober + ?Sized,
    F: Fn(usize, usize, &Target, &ProbeOutcome) + Sync,
{
    BatchPool::new(workers.min(targets.len()))
        .run_until(targets, settings, prober, || false, on_done)
        .unwrap_or_default()
}

/// Worker threads for batch probing, built once and reused across batches.
pub struct BatchPool {
    pool: Option<rayon::ThreadPool>,
}

impl BatchPool {
    /// With one worker or fewer, the batch runs on the calling thread.
    pub fn new(workers: usize) -> Self {
        if workers <= 1 {
            return Self { pool: None };
        }

        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => Self { pool: Some(pool) },
            Err(err) => {
                warn!(error = %err, "failed to build worker pool; running sequentially");
                Self { pool: None }
            }
        }
    }

    pub fn workers(&self) -> usize {
        self.pool
            .as_ref()
            .map(|pool| pool.current_num_threads())
            .unwrap_or(1)
    }

    /// Checks every target, returning results in `targets` order.
    ///
    /// `stop` is consulted before each target starts; once it returns `true`
    /// no further targets are started and the batch yields `None`. `on_done`
    /// is called as each target finishes with the number completed so far
    /// and the total.
    pub fn run_until<P, S, F>(
        &self,
        targets: &[Target],
        settings: &ProbeSettings,
        prober: &P,
        stop: S,
        on_done: F,
    ) -> Option<Vec<(Target, ProbeOutcome)>>
    where
        P: Prober + ?Sized,
        S: Fn() -> bool + Sync,
        F: Fn(usize, usize, &Target, &ProbeOutcome) + Sync,
    {
        let total = targets.len();
        let completed = AtomicUsize::new(0);
        let probe_one = |target: &Target| {
            if stop() {
                return None;
            }
            let outcome = prober.probe(target, settings);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            on_done(done, total, target, &outcome);
            Some((target.clone(), outcome))
        };

        match &self.pool {
            Some(pool) if total > 1 => {
                pool.install(|| targets.par_iter().map(probe_one).collect())
            }
            _ => targets.iter().map(probe_one).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_args_use_seconds() {
        let settings = ProbeSettings {
            timeout_secs: 2,
            count: 3,
            policy: SuccessPolicy::Any,
        };
        assert_eq!(
            ping_args("8.8.8.8", &settings, false),
            vec!["-c", "3", "-W", "2", "8.8.8.8"]
        );
    }

    #[test]
    fn windows_args_use_milliseconds() {
        let settings = ProbeSettings::default();
        assert_eq!(
            ping_args("8.8.8.8", &settings, true),
            vec!["-n", "1", "-w", "3000", "8.8.8.8"]
        );
    }

    #[test]
    fn deadline_covers_every_packet() {
        let settings = ProbeSettings {
            timeout_secs: 2,
            count: 4,
            policy: SuccessPolicy::All,
        };
        assert_eq!(settings.deadline(), Duration::from_secs(13));
    }

    #[test]
    fn missing_program_is_reported() {
        let prober = SystemPingProber::new("pingwatch-no-such-program");
        let err = ensure_ping_available(&prober).unwrap_err();
        assert!(err.to_string().contains("pingwatch-no-such-program"));
    }

    #[test]
    fn spawn_failure_is_an_outcome() {
        let prober = SystemPingProber::new("pingwatch-no-such-program");
        let outcome = prober.probe(&Target::from("127.0.0.1"), &ProbeSettings::default());
        assert!(!outcome.alive);
        assert!(matches!(outcome.detail, pingwatch_model::ProbeDetail::Error(_)));
    }

    #[test]
    fn pool_of_one_runs_inline() {
        assert_eq!(BatchPool::new(0).workers(), 1);
        assert_eq!(BatchPool::new(1).workers(), 1);
        assert_eq!(BatchPool::new(3).workers(), 3);
    }
}
