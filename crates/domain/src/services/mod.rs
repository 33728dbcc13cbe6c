//! Shared in-process services: signature caching, destination queues and
//! telemetry wiring.

pub mod cache;
pub mod queue;
pub mod telemetry;

pub use cache::*;
pub use queue::*;
pub use telemetry::*;
