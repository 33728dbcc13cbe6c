//! Buy-alert pipeline: turns confirmed transaction events into queued
//! notifications for every destination watching the bought token.
//!
//! The library is embedded by the API process, which feeds ingested events
//! to an [`EventProcessor`] and serves the resulting destination queues.

pub mod compose;
pub mod diff;
pub mod enrich;
pub mod market;
pub mod matcher;
pub mod pipeline;
pub mod worker;

pub use compose::NotificationComposer;
pub use diff::{compute_token_changes, TokenChanges};
pub use enrich::{EnrichmentError, MarketDataEnricher};
pub use market::{
    AccountInfoProvider, HttpPriceProvider, MintSupply, PriceProvider, ProviderError,
    RpcAccountInfoProvider,
};
pub use matcher::{apply_thresholds, find_candidates, Candidate};
pub use pipeline::{process_event, EventOutcome, MalformedEvent, MonitorContext};
pub use worker::{build_live_processor, EventProcessor, MonitorError};
