use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared stop flag. Setting it is the only thing a signal handler does.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Waits between cycles.
pub trait Sleeper {
    /// Returns `false` if `cancel` fired before `duration` elapsed.
    fn sleep(&mut self, duration: Duration, cancel: &CancelToken) -> bool;
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration, cancel: &CancelToken) -> bool {
        (**self).sleep(duration, cancel)
    }
}

/// Sleeps in short slices so a cancel is noticed promptly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration, cancel: &CancelToken) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancelToken::new();
        let handler_side = token.clone();
        assert!(!token.is_cancelled());
        handler_side.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn sleep_returns_early_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let started = Instant::now();
        assert!(!ThreadSleeper.sleep(Duration::from_secs(30), &token));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_observes_cancel_from_another_thread() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            remote.cancel();
        });
        assert!(!ThreadSleeper.sleep(Duration::from_secs(30), &token));
        handle.join().unwrap();
    }

    #[test]
    fn sleep_completes_without_cancel() {
        let token = CancelToken::new();
        assert!(ThreadSleeper.sleep(Duration::from_millis(20), &token));
    }
}
