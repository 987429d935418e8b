use pingwatch_model::{ProbeOutcome, Target};
use pingwatch_probe::{probe_all, probe_all_with_progress, BatchPool, ProbeSettings, Prober};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

struct FakeProber {
    delays: HashMap<String, Duration>,
    alive: Vec<String>,
    calls: AtomicUsize,
}

impl FakeProber {
    fn new(delays: HashMap<String, Duration>, alive: &[&str]) -> Self {
        Self {
            delays,
            alive: alive.iter().map(|value| value.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Prober for FakeProber {
    fn probe(&self, target: &Target, _settings: &ProbeSettings) -> ProbeOutcome {
        if let Some(delay) = self.delays.get(target.as_str()) {
            thread::sleep(*delay);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.alive.iter().any(|value| value == target.as_str()) {
            ProbeOutcome::alive()
        } else {
            ProbeOutcome::not_reachable()
        }
    }
}

fn targets(values: &[&str]) -> Vec<Target> {
    values.iter().map(|value| Target::from(*value)).collect()
}

#[test]
fn ordering_is_stable_with_concurrency() {
    let mut delays = HashMap::new();
    delays.insert("slow".to_string(), Duration::from_millis(50));
    delays.insert("fast".to_string(), Duration::from_millis(0));

    let prober = FakeProber::new(delays, &["slow"]);
    let list = targets(&["slow", "fast"]);

    let results = probe_all(&list, &ProbeSettings::default(), 2, &prober);

    let order: Vec<(&str, bool)> = results
        .iter()
        .map(|(target, outcome)| (target.as_str(), outcome.alive))
        .collect();
    assert_eq!(order, vec![("slow", true), ("fast", false)]);
    assert_eq!(prober.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn ordering_matches_between_worker_counts() {
    let list = targets(&["a", "b", "c", "d"]);
    let settings = ProbeSettings::default();

    let sequential = probe_all(&list, &settings, 1, &FakeProber::new(HashMap::new(), &["b"]));
    let parallel = probe_all(&list, &settings, 4, &FakeProber::new(HashMap::new(), &["b"]));

    assert_eq!(sequential, parallel);
}

#[test]
fn progress_reports_every_completion() {
    let list = targets(&["a", "b", "c"]);
    let prober = FakeProber::new(HashMap::new(), &["a", "c"]);
    let seen = Mutex::new(Vec::new());

    probe_all_with_progress(&list, &ProbeSettings::default(), 3, &prober, |done, total, _, _| {
        seen.lock().unwrap().push((done, total));
    });

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
}

#[test]
fn stop_halts_new_work_on_a_reused_pool() {
    let mut delays = HashMap::new();
    for idx in 0..20 {
        delays.insert(format!("t{idx}"), Duration::from_millis(20));
    }
    let names: Vec<String> = (0..20).map(|idx| format!("t{idx}")).collect();
    let list: Vec<Target> = names.iter().map(|name| Target::from(name.as_str())).collect();
    let pool = BatchPool::new(2);
    let settings = ProbeSettings::default();

    let prober = FakeProber::new(delays.clone(), &[]);
    let full = pool.run_until(&list, &settings, &prober, || false, |_, _, _, _| {});
    assert_eq!(full.map(|results| results.len()), Some(20));

    let prober = FakeProber::new(delays, &[]);
    // Lets exactly one target start, then reports stopped to every later check.
    let stopped = AtomicBool::new(false);
    let partial = pool.run_until(
        &list,
        &settings,
        &prober,
        || stopped.swap(true, Ordering::SeqCst),
        |_, _, _, _| {},
    );

    assert!(partial.is_none());
    assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
}
