use std::{collections::HashMap, fmt};

use serde::{Deserialize, Deserializer};

use crate::{BandwagonError, Result};

const BYTES_PER_GB: i64 = 1024 * 1024 * 1024;

/// Reply of the action endpoints (start, stop, kill, restart, shell exec).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ActionResponse {
    /// Zero on success, upstream error code otherwise.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: i64,
    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    /// Returns `true` when the API reported `error: 0`.
    pub fn is_success(&self) -> bool {
        self.error == 0
    }

    /// Converts a non-zero `error` code into [`BandwagonError::Api`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BandwagonError::Api {
                code: self.error,
                message: self.message,
            })
        }
    }
}

impl fmt::Display for ActionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error: {}, message: {}",
            self.error,
            self.message.as_deref().unwrap_or_default()
        )
    }
}

/// VPS state returned by `getServiceInfo`.
///
/// Every field is defaulted, and an explicit `null` decodes like a missing
/// key, so partial or older payloads still decode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub vm_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hostname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub node_ip: String,
    #[serde(deserialize_with = "null_as_default")]
    pub node_alias: String,
    #[serde(deserialize_with = "null_as_default")]
    pub node_location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub node_location_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub node_datacenter: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location_ipv6_ready: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub plan: String,
    /// Monthly transfer allowance in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub plan_monthly_data: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_data_multiplier: i64,
    /// Disk size in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub plan_disk: i64,
    /// RAM in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub plan_ram: i64,
    /// Swap in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub plan_swap: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub plan_max_ipv6s: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub os: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// Transfer used in the current period, in bytes.
    #[serde(deserialize_with = "null_as_default")]
    pub data_counter: i64,
    /// Unix timestamp of the next transfer counter reset.
    #[serde(deserialize_with = "null_as_default")]
    pub data_next_reset: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_addresses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub private_ip_addresses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_nullroutes: Vec<String>,
    pub iso1: Option<String>,
    pub iso2: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub available_isos: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub plan_private_network_available: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub location_private_network_available: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub rdns_api_available: bool,
    /// Reverse DNS records keyed by IP address.
    #[serde(deserialize_with = "null_as_default")]
    pub ptr: HashMap<String, Option<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub suspended: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub policy_violation: bool,
    #[serde(deserialize_with = "count_or_flag")]
    pub suspension_count: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_abuse_points: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_abuse_points: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub error: i64,
}

impl ServiceInfo {
    /// First assigned IPv4 address, or an empty string when none is listed.
    pub fn ipv4(&self) -> &str {
        self.ip_addresses.first().map(String::as_str).unwrap_or_default()
    }

    /// Transfer used in the current period, truncated to whole GiB.
    pub fn data_counter_gb(&self) -> i64 {
        self.data_counter / BYTES_PER_GB
    }

    /// Next transfer reset as `YYYY-MM-DD HH:MM:SS` (UTC).
    ///
    /// Returns an empty string when the timestamp is out of range.
    pub fn reset_time(&self) -> String {
        chrono::DateTime::from_timestamp(self.data_next_reset, 0)
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IP Address: {}, Bandwidth Usage: {} GB, Reset time: {}",
            self.ipv4(),
            self.data_counter_gb(),
            self.reset_time()
        )
    }
}

/// Decodes `null` as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountOrFlag {
    Count(u64),
    Flag(bool),
}

/// Older payloads report `suspension_count` as a boolean.
fn count_or_flag<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<CountOrFlag>::deserialize(deserializer)?.map(|value| match value {
            CountOrFlag::Count(count) => count,
            CountOrFlag::Flag(flag) => u64::from(flag),
        }),
    )
}
