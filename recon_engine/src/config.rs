use std::{env, time::Duration};

use log::*;

const DEFAULT_MAX_CONCURRENT_RUNS: usize = 1;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_REPORT_PREVIEW_LIMIT: usize = 50;

/// Engine tuning knobs, read from `RECON_*` environment variables with sensible defaults.
#[derive(Clone, Debug)]
pub struct ReconciliationConfig {
    /// How many reconciliation runs may execute at once. Daily batch jobs want 1; anything higher re-opens the
    /// check-then-act gap that `has_running_task` cannot close on its own.
    pub max_concurrent_runs: usize,
    /// Upper bound on each ledger fetch. A fetch exceeding this fails the run with a timeout message instead of
    /// occupying an executor slot forever.
    pub fetch_timeout: Duration,
    /// Resolved discrepancies and reports older than this many days are removed by the retention sweep.
    pub retention_days: i64,
    /// How many discrepancy previews a summary report embeds.
    pub report_preview_limit: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retention_days: DEFAULT_RETENTION_DAYS,
            report_preview_limit: DEFAULT_REPORT_PREVIEW_LIMIT,
        }
    }
}

impl ReconciliationConfig {
    pub fn from_env_or_default() -> Self {
        let max_concurrent_runs = env_or("RECON_MAX_CONCURRENT_RUNS", DEFAULT_MAX_CONCURRENT_RUNS);
        let fetch_timeout_secs = env_or("RECON_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT.as_secs());
        let retention_days = env_or("RECON_RETENTION_DAYS", DEFAULT_RETENTION_DAYS);
        let report_preview_limit = env_or("RECON_REPORT_PREVIEW_LIMIT", DEFAULT_REPORT_PREVIEW_LIMIT);
        Self {
            max_concurrent_runs: max_concurrent_runs.max(1),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            retention_days,
            report_preview_limit,
        }
    }
}

fn env_or<T: std::str::FromStr + std::fmt::Display>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!("{var} is set but could not be parsed ({raw}). Using the default ({default}).");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ReconciliationConfig::default();
        assert_eq!(cfg.max_concurrent_runs, 1);
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(300));
        assert_eq!(cfg.retention_days, 30);
        assert_eq!(cfg.report_preview_limit, 50);
    }
}
