//! `bandwagon-http` is an async client for the 64clouds / BandwagonHost VPS
//! control API.
//!
//! The upstream API is flaky: single requests regularly stall or fail. Every
//! call in this crate is therefore sent as a *race*: the same GET goes out
//! over several independent connections at once, the first body to arrive
//! wins, and the whole race is bounded by one deadline. See [`race`](mod@race).
//!
//! Operations:
//! - [`BandwagonClient::info`]
//! - [`BandwagonClient::start`], [`BandwagonClient::stop`],
//!   [`BandwagonClient::kill`], [`BandwagonClient::reboot`]
//! - [`BandwagonClient::command`]
//!
//! ```no_run
//! use bandwagon_http::{BandwagonClient, Credentials};
//!
//! # async fn run() -> bandwagon_http::Result<()> {
//! let vps = BandwagonClient::new(Credentials::new("123456", "private_key"));
//! let info = vps.info().await?;
//! println!("{info}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod options;
pub mod race;
pub mod transport;
mod types;

#[cfg(feature = "raw-mode")]
pub mod raw;

pub use client::{BandwagonClient, Credentials, DEFAULT_BASE_URL};
pub use error::BandwagonError;
pub use options::{ClientOptions, RaceOptions, DEFAULT_DEADLINE, DEFAULT_FANOUT};
pub use race::{race, race_with, RequestTemplate};
pub use transport::{build_transport, TransportConfig};
pub use types::{ActionResponse, ServiceInfo};

pub type Result<T> = std::result::Result<T, BandwagonError>;
