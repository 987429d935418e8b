use pingwatch_model::Target;
use pingwatch_probe::ProbeSettings;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no targets provided")]
    NoTargets,

    #[error("{0} must be at least 1")]
    NonPositive(&'static str),
}

/// Validated inputs of a monitoring session. Immutable once built.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    targets: Vec<Target>,
    interval_secs: u64,
    probe: ProbeSettings,
    parallelism: usize,
}

impl MonitorConfig {
    /// Repeated targets keep only their first position.
    pub fn new(
        targets: Vec<Target>,
        interval_secs: u64,
        probe: ProbeSettings,
        parallelism: usize,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let targets: Vec<Target> = targets
            .into_iter()
            .filter(|target| seen.insert(target.clone()))
            .collect();

        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if interval_secs == 0 {
            return Err(ConfigError::NonPositive("interval"));
        }
        validate_probe_settings(&probe)?;

        Ok(Self {
            targets,
            interval_secs,
            probe,
            parallelism: parallelism.max(1),
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe(&self) -> &ProbeSettings {
        &self.probe
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }
}

pub fn validate_probe_settings(settings: &ProbeSettings) -> Result<(), ConfigError> {
    if settings.timeout_secs == 0 {
        return Err(ConfigError::NonPositive("timeout"));
    }
    if settings.count == 0 {
        return Err(ConfigError::NonPositive("count"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(values: &[&str]) -> Vec<Target> {
        values.iter().map(|value| Target::from(*value)).collect()
    }

    #[test]
    fn rejects_empty_targets() {
        let err = MonitorConfig::new(Vec::new(), 10, ProbeSettings::default(), 1).unwrap_err();
        assert_eq!(err, ConfigError::NoTargets);
    }

    #[test]
    fn rejects_zero_values() {
        let err = MonitorConfig::new(targets(&["a"]), 0, ProbeSettings::default(), 1).unwrap_err();
        assert_eq!(err, ConfigError::NonPositive("interval"));

        let probe = ProbeSettings {
            timeout_secs: 0,
            ..ProbeSettings::default()
        };
        let err = MonitorConfig::new(targets(&["a"]), 5, probe, 1).unwrap_err();
        assert_eq!(err.to_string(), "timeout must be at least 1");

        let probe = ProbeSettings {
            count: 0,
            ..ProbeSettings::default()
        };
        let err = MonitorConfig::new(targets(&["a"]), 5, probe, 1).unwrap_err();
        assert_eq!(err, ConfigError::NonPositive("count"));
    }

    #[test]
    fn collapses_duplicates_in_order() {
        let config =
            MonitorConfig::new(targets(&["b", "a", "b"]), 5, ProbeSettings::default(), 0).unwrap();
        assert_eq!(config.targets(), targets(&["b", "a"]).as_slice());
        assert_eq!(config.parallelism(), 1);
        assert_eq!(config.interval(), Duration::from_secs(5));
    }
}
