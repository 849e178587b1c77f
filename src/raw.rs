//! Untyped response passthrough.
//!
//! Enabled with the `raw-mode` feature, for endpoints that have no typed
//! shape in this crate.

#[derive(Clone, Debug, PartialEq)]
pub struct RawResponse(pub serde_json::Value);
