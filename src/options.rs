use std::time::Duration;

use crate::transport::TransportConfig;

/// Number of duplicate attempts launched per race.
pub const DEFAULT_FANOUT: usize = 20;

/// Race-wide wall-clock deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(3_000);

/// Configures how a single request is raced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RaceOptions {
    /// Number of concurrent attempts. Zero is treated as one.
    pub fanout: usize,
    /// Deadline for the whole race, independent of per-attempt timeouts.
    pub deadline: Duration,
    /// Resolve as soon as every attempt has failed instead of waiting out
    /// the deadline.
    pub fail_fast: bool,
}

impl Default for RaceOptions {
    fn default() -> Self {
        Self {
            fanout: DEFAULT_FANOUT,
            deadline: DEFAULT_DEADLINE,
            fail_fast: false,
        }
    }
}

impl RaceOptions {
    /// Sets the fan-out count.
    pub fn fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout;
        self
    }

    /// Sets the race deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Enables or disables early failure once all attempts have failed.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub(crate) fn effective_fanout(&self) -> usize {
        self.fanout.max(1)
    }
}

/// Configures race and transport behavior of a [`crate::BandwagonClient`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClientOptions {
    /// Fan-out, deadline and failure policy for every API call.
    pub race: RaceOptions,
    /// Per-attempt HTTP client settings.
    pub transport: TransportConfig,
}
