use anyhow::{anyhow, Context, Result};
use std::io::{BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ProcessOutput {
    /// `None` when the process was killed at the deadline.
    pub status: Option<ExitStatus>,
    pub stdout: String,
}

impl ProcessOutput {
    pub fn timed_out(&self) -> bool {
        self.status.is_none()
    }

    pub fn success(&self) -> bool {
        self.status.map(|status| status.success()).unwrap_or(false)
    }
}

/// Runs `command` to completion, killing it once `deadline` has elapsed.
pub fn run_with_deadline(command: &mut Command, deadline: Duration) -> Result<ProcessOutput> {
    let program = command.get_program().to_string_lossy().to_string();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let Some(stdout) = child.stdout.take() else {
        stop(&mut child);
        return Err(anyhow!("missing {program} stdout"));
    };

    let reader = thread::spawn(move || {
        let mut buf = String::new();
        let _ = BufReader::new(stdout).read_to_string(&mut buf);
        buf
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if started.elapsed() >= deadline => {
                stop(&mut child);
                break None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                stop(&mut child);
                let _ = reader.join();
                return Err(err).with_context(|| format!("failed to wait for {program}"));
            }
        }
    };

    let stdout = reader.join().unwrap_or_default();

    Ok(ProcessOutput { status, stdout })
}

/// Kills and reaps `child` so no process outlives the call.
fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn overrunning_child_is_killed_at_deadline() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let started = Instant::now();
        let output = run_with_deadline(&mut command, Duration::from_millis(100)).unwrap();

        assert!(output.timed_out());
        assert!(!output.success());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn finished_child_keeps_its_output() {
        let mut command = Command::new("echo");
        command.arg("3 packets transmitted, 3 received");

        let output = run_with_deadline(&mut command, Duration::from_secs(5)).unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "3 packets transmitted, 3 received");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut command = Command::new("pingwatch-no-such-program");
        let err = run_with_deadline(&mut command, Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
