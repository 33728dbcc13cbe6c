use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::MonitoredToken;

/// Common result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Durable record of already admitted transaction signatures.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// Records the signature and returns `true` the first time it is seen.
    /// A duplicate key yields `Ok(false)`, never an error.
    async fn insert_if_absent(&self, signature: &str) -> StorageResult<bool>;
}

/// Read-only view over the monitored-token registry.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    async fn find_by_mints(&self, mints: &HashSet<String>) -> StorageResult<Vec<MonitoredToken>>;
}
