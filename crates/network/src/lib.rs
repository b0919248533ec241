// crates/network/src/lib.rs
//! HTTP access to Radarr/Sonarr instances
//!
//! [`ServiceClient`] implements [`guidesync_core::RemoteApi`] over the
//! service's v3 REST API. Reads are retried on transport failures and 5xx
//! responses; client errors (4xx) and all writes are attempted once.

mod client;
mod error;
mod retry;

pub use client::{ClientConfig, ServiceClient};
pub use error::{NetworkError, NetworkResult};
pub use retry::RetryPolicy;
