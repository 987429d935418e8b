mod logging;
mod output;
mod targets;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pingwatch_monitor::{run_check, CancelToken, CheckOptions, Monitor, MonitorConfig, Palette};
use pingwatch_probe::{ProbeSettings, SuccessPolicy, SystemPingProber};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "pingwatch",
    version,
    about = "Ping reachability checks and round robin monitoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Check(CheckArgs),
    Watch(WatchArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Alive when at least one echo request is answered.
    Any,
    /// Alive only when every echo request is answered.
    All,
}

impl From<PolicyArg> for SuccessPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Any => SuccessPolicy::Any,
            PolicyArg::All => SuccessPolicy::All,
        }
    }
}

#[derive(Args)]
struct ProbeArgs {
    /// Addresses or hostnames to probe.
    #[arg(value_name = "TARGET")]
    target_list: Vec<String>,

    /// File with one target per line.
    #[arg(long, short = 'f')]
    targets: Option<PathBuf>,

    /// Seconds to wait for each reply.
    #[arg(long, short = 't', default_value_t = 3)]
    timeout: u64,

    /// Echo requests per probe.
    #[arg(long, short = 'c', default_value_t = 1)]
    count: u32,

    #[arg(long, value_enum, default_value_t = PolicyArg::Any)]
    policy: PolicyArg,

    /// Disable colored output.
    #[arg(long)]
    plain: bool,
}

impl ProbeArgs {
    fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout_secs: self.timeout,
            count: self.count,
            policy: self.policy.into(),
        }
    }

    fn palette(&self) -> Palette {
        if self.plain || !io::stdout().is_terminal() {
            Palette::plain()
        } else {
            Palette::colored()
        }
    }
}

#[derive(Args)]
#[command(about = "Probe every target once; exit 0 if all alive, 1 if some, 2 if none")]
struct CheckArgs {
    #[command(flatten)]
    probe: ProbeArgs,

    /// Maximum concurrent probes.
    #[arg(long, short = 'w', default_value_t = 10)]
    workers: usize,

    /// Only print the alive total.
    #[arg(long, short = 'q')]
    quiet: bool,

    #[arg(long)]
    no_summary: bool,

    /// Print each result as it completes.
    #[arg(long, short = 'p')]
    show_progress: bool,
}

#[derive(Args)]
#[command(about = "Probe the targets every interval until interrupted with Ctrl+C")]
struct WatchArgs {
    #[command(flatten)]
    probe: ProbeArgs,

    /// Seconds to sleep after each cycle.
    #[arg(long, short = 'i', default_value_t = 10)]
    interval: u64,

    /// Probe up to this many targets at once within a cycle.
    #[arg(long, default_value_t = 1)]
    parallel: usize,

    /// Print each target as it is probed.
    #[arg(long, short = 'p')]
    show_progress: bool,

    /// Write the final statistics as JSON to this file on exit.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    logging::init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => run_check_command(args),
        Commands::Watch(args) => run_watch(args),
    }
}

fn run_check_command(args: CheckArgs) -> Result<i32> {
    let targets = targets::collect_targets(
        args.probe.targets.as_deref(),
        args.probe.target_list.clone(),
    )?;
    let settings = args.probe.settings();
    let options = CheckOptions {
        workers: args.workers,
        quiet: args.quiet,
        summary: !args.no_summary,
        show_progress: args.show_progress,
        palette: args.probe.palette(),
    };

    let prober = SystemPingProber::default();
    let mut out = io::stdout();
    let summary = run_check(&targets, &settings, &options, &prober, &mut out)?;

    info!(
        alive = summary.alive_count(),
        total = summary.total(),
        "check finished"
    );
    Ok(summary.exit_code())
}

fn run_watch(args: WatchArgs) -> Result<i32> {
    let targets = targets::collect_targets(
        args.probe.targets.as_deref(),
        args.probe.target_list.clone(),
    )?;
    let config = MonitorConfig::new(
        targets,
        args.interval,
        args.probe.settings(),
        args.parallel,
    )?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install Ctrl+C handler")?;

    let prober = SystemPingProber::default();
    let started_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = Monitor::new(config, &prober)
        .with_palette(args.probe.palette())
        .with_progress(args.show_progress)
        .run(&mut out, &cancel)?;

    if let Some(path) = args.report {
        let finished_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        output::write_json(&path, &stats.to_report(started_at_utc, finished_at_utc))?;
        info!(path = %path.display(), "wrote final statistics");
    }

    Ok(0)
}
