//! Per-attempt HTTP client construction.
//!
//! Every race attempt owns its own `reqwest::Client`, so attempts never
//! share a connection pool and each one opens a fresh connection.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::{BandwagonError, Result};

/// Default timeout for every connection phase.
pub const PHASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeouts applied to each attempt's HTTP client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportConfig {
    /// How long an idle connection may linger before being closed.
    pub idle_timeout: Duration,
    /// TCP connect plus TLS handshake timeout.
    pub connect_timeout: Duration,
    /// Maximum wait between reads, which bounds the wait for response headers.
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            idle_timeout: PHASE_TIMEOUT,
            connect_timeout: PHASE_TIMEOUT,
            read_timeout: PHASE_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Builds a fresh, non-pooling HTTP client.
    ///
    /// Compression decoders are not compiled in and no idle connection is
    /// kept, so every request goes out uncompressed on its own connection.
    pub fn build(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

        reqwest::Client::builder()
            .default_headers(headers)
            .pool_idle_timeout(self.idle_timeout)
            .pool_max_idle_per_host(0)
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .build()
            .map_err(BandwagonError::Transport)
    }
}

/// Builds an attempt client with the default 5 second phase timeouts.
pub fn build_transport() -> Result<reqwest::Client> {
    TransportConfig::default().build()
}
