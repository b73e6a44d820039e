//! The offline cache worker.
//!
//! This crate implements the request-interception side of shellcache: a
//! router that classifies every intercepted GET request, one caching
//! strategy per class, and the install/activate lifecycle that keeps the
//! versioned cache partitions fresh.
//!
//! The worker never fails a fetch interception: every handled request
//! resolves to a response or an explicit passthrough decision, with
//! fallback chains absorbing network and storage failures.

pub mod events;
pub mod handler;
pub mod lifecycle;
pub mod request;
pub mod router;
pub mod strategies;

pub use events::{ControlMessage, ServiceWorker, WorkerEvent, WorkerState};
pub use handler::CacheWorker;
pub use lifecycle::{ActivateReport, InstallReport};
pub use request::{FetchOutcome, FetchRequest, RequestMode, ServedFrom, WorkerResponse};
pub use router::RequestClass;

#[cfg(test)]
pub(crate) mod testutil;
