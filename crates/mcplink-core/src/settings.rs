//! Connection manager tuning knobs

use std::time::Duration;

use tracing::warn;

/// Default idle time after which a pooled connection is evicted (5 minutes)
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Default interval between staleness sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default bound on establishing a connection plus its smoke test
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout applied to each detection probe handshake
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Connections idle for longer than this are disconnected by the sweep
    pub stale_after: Duration,
    /// How often the sweep runs; independent of `stale_after`
    pub sweep_interval: Duration,
    /// Used when a server record carries no `maxTotalTimeout`
    pub connect_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl ManagerSettings {
    /// Defaults overridden by `MCPLINK_*_SECS` environment variables.
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: Duration| -> Duration {
            match lookup(key) {
                None => fallback,
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => Duration::from_secs(secs),
                    _ => {
                        warn!(key, value = %raw, "Ignoring invalid duration setting");
                        fallback
                    }
                },
            }
        };

        Self {
            stale_after: read("MCPLINK_STALE_AFTER_SECS", defaults.stale_after),
            sweep_interval: read("MCPLINK_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            connect_timeout: read("MCPLINK_CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
            probe_timeout: read("MCPLINK_PROBE_TIMEOUT_SECS", defaults.probe_timeout),
        }
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
