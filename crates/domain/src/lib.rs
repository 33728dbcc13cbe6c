//! Domain-level building blocks shared across the monitor, storage and API
//! crates: the typed transaction event schema, registry records, storage
//! seams, environment configuration and the in-process services (telemetry,
//! signature cache, destination queues).

pub mod config;
pub mod model;
pub mod services;
pub mod storage;

pub use model::*;
pub use storage::*;
