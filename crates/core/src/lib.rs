//! Shared vocabulary for guidesync
//!
//! Value types used by every crate in the workspace (service kinds, instance
//! names, guide content keys, remote identifiers), the remote API contract
//! and the error taxonomy that decides how far a failure is allowed to
//! propagate.

pub mod error;
pub mod remote;
pub mod types;

pub use error::{ClassifiedError, ErrorClass};
pub use remote::{RemoteApi, RemoteError, RemoteResult};
pub use types::{ContentKey, InstanceName, RecordKind, RemoteId, ServiceType};
