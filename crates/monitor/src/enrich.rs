use std::{sync::Arc, time::Duration};

use buy_alert_domain::model::MarketSnapshot;
use thiserror::Error;
use tokio::time::timeout;

use crate::market::{AccountInfoProvider, PriceProvider, ProviderError};

/// Reasons a single `(mint, destination)` candidate is dropped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("account info not found")]
    AccountNotFound,
    #[error("price not found for `{id}`")]
    PriceMissing { id: String },
    #[error("total supply is zero")]
    ZeroSupply,
    #[error("{lookup} lookup timed out")]
    Timeout { lookup: &'static str },
    #[error("{lookup} provider failed: {source}")]
    Provider {
        lookup: &'static str,
        #[source]
        source: ProviderError,
    },
}

impl EnrichmentError {
    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "account_not_found",
            Self::PriceMissing { .. } => "price_missing",
            Self::ZeroSupply => "zero_supply",
            Self::Timeout { .. } => "timeout",
            Self::Provider { .. } => "provider",
        }
    }
}

/// Joins the mint metadata lookup and the price quote into a snapshot.
#[derive(Clone)]
pub struct MarketDataEnricher {
    accounts: Arc<dyn AccountInfoProvider>,
    prices: Arc<dyn PriceProvider>,
    native_asset_id: String,
    lookup_timeout: Duration,
}

impl MarketDataEnricher {
    pub fn new(
        accounts: Arc<dyn AccountInfoProvider>,
        prices: Arc<dyn PriceProvider>,
        native_asset_id: impl Into<String>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            prices,
            native_asset_id: native_asset_id.into(),
            lookup_timeout,
        }
    }

    /// Both lookups run concurrently and are awaited to completion; one
    /// failing does not cancel the other. The snapshot is only built when the
    /// mint exists with a non-zero supply and both prices are quoted.
    pub async fn snapshot(&self, mint: &str) -> Result<MarketSnapshot, EnrichmentError> {
        let ids = [mint.to_owned(), self.native_asset_id.clone()];
        let (supply, quotes) = tokio::join!(
            timeout(self.lookup_timeout, self.accounts.mint_supply(mint)),
            timeout(self.lookup_timeout, self.prices.prices(&ids)),
        );

        let supply = supply
            .map_err(|_| EnrichmentError::Timeout {
                lookup: "account_info",
            })?
            .map_err(|source| EnrichmentError::Provider {
                lookup: "account_info",
                source,
            })?
            .ok_or(EnrichmentError::AccountNotFound)?;

        let quotes = quotes
            .map_err(|_| EnrichmentError::Timeout { lookup: "price" })?
            .map_err(|source| EnrichmentError::Provider {
                lookup: "price",
                source,
            })?;
        let token_price = token_price(quotes.get(mint).copied(), mint)?;
        let sol_price = native_price(
            quotes.get(&self.native_asset_id).copied(),
            &self.native_asset_id,
        )?;

        if supply.raw_supply == 0 {
            return Err(EnrichmentError::ZeroSupply);
        }

        Ok(MarketSnapshot::from_supply(
            supply.raw_supply,
            supply.decimals,
            token_price,
            sol_price,
        ))
    }
}

// A quoted token may trade at zero; a non-finite quote is treated as absent.
fn token_price(price: Option<f64>, id: &str) -> Result<f64, EnrichmentError> {
    match price {
        Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(EnrichmentError::PriceMissing { id: id.to_owned() }),
    }
}

// The native price divides the spend, so it must be strictly positive.
fn native_price(price: Option<f64>, id: &str) -> Result<f64, EnrichmentError> {
    match price {
        Some(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(EnrichmentError::PriceMissing { id: id.to_owned() }),
    }
}
