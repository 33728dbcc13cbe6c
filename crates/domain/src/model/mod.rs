//! Data structures shared across the monitor, storage and API crates.

use serde::{Deserialize, Serialize};

mod event;

pub use event::{
    AccountKey, EventMessage, EventTransaction, InnerTransaction, TokenBalance,
    TransactionEvent, TransactionMeta, UiTokenAmount,
};

/// Registry entry describing a token watched on behalf of one destination.
///
/// The registry is owned externally; several entries may share a mint, each
/// with its own destination and threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredToken {
    pub mint: String,
    pub destination_id: String,
    pub image: String,
    pub name: String,
    pub symbol: String,
    /// Minimum absolute holding change (UI units) worth an alert.
    pub min_value: f64,
    /// Decoration unit repeated once per `min_value` bought.
    pub min_value_emojis: String,
    pub dex_t_url: String,
}

/// Per-mint holding delta of the transaction signer within one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenChange {
    pub is_new_holder: bool,
    /// Always `|post - pre|`.
    pub amount: f64,
    /// `amount * 100 / pre`; `None` for new holders where `pre == 0`.
    pub position_increase: Option<f64>,
}

impl TokenChange {
    /// Builds the change between two UI amounts, or `None` when nothing moved.
    pub fn between(pre: f64, post: f64) -> Option<Self> {
        if post == pre {
            return None;
        }
        let amount = (post - pre).abs();
        let is_new_holder = pre == 0.0;
        let position_increase = if is_new_holder {
            None
        } else {
            Some(amount * 100.0 / pre)
        };
        Some(Self {
            is_new_holder,
            amount,
            position_increase,
        })
    }
}

/// Market data gathered for a single mint while composing one alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSnapshot {
    pub token_price_usd: f64,
    pub sol_price_usd: f64,
    pub decimals: u8,
    /// Supply already scaled by `decimals`.
    pub total_supply: f64,
    pub market_cap: u64,
}

impl MarketSnapshot {
    /// Scales the raw supply and floors `total_supply * token_price_usd`.
    pub fn from_supply(
        raw_supply: u128,
        decimals: u8,
        token_price_usd: f64,
        sol_price_usd: f64,
    ) -> Self {
        let total_supply = raw_supply as f64 / 10f64.powi(i32::from(decimals));
        let market_cap = (total_supply * token_price_usd).floor();
        Self {
            token_price_usd,
            sol_price_usd,
            decimals,
            total_supply,
            // Saturating float-to-int cast; negative prices never come back from the feed.
            market_cap: market_cap as u64,
        }
    }
}

/// Payload handed to the external dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub destination_id: String,
    pub image: String,
    pub caption: String,
}
