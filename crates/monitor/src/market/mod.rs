//! Market data providers: on-chain mint metadata over Solana JSON-RPC and
//! USD quotes from an HTTP price feed.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

mod types;

pub use types::{
    AccountData, AccountInfoResult, JsonRpcRequest, JsonRpcResponse, MintInfo, PriceResponse,
};

/// Decimals and raw integer supply of a mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintSupply {
    pub decimals: u8,
    pub raw_supply: u128,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Http(value.to_string())
        }
    }
}

#[async_trait]
pub trait AccountInfoProvider: Send + Sync {
    /// Returns `None` when the account does not exist or is not a mint.
    async fn mint_supply(&self, mint: &str) -> Result<Option<MintSupply>, ProviderError>;
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// USD price per id. Ids the feed does not know are absent from the map.
    async fn prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ProviderError>;
}

pub struct RpcAccountInfoProvider {
    client: Client,
    rpc_url: String,
}

impl RpcAccountInfoProvider {
    pub fn new(client: Client, rpc_url: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
        }
    }
}

#[async_trait]
impl AccountInfoProvider for RpcAccountInfoProvider {
    async fn mint_supply(&self, mint: &str) -> Result<Option<MintSupply>, ProviderError> {
        let request = JsonRpcRequest::new(
            "getAccountInfo",
            json!([mint, { "encoding": "jsonParsed" }]),
        );
        let response: JsonRpcResponse<AccountInfoResult> = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        decode_account_info(response)
    }
}

fn decode_account_info(
    response: JsonRpcResponse<AccountInfoResult>,
) -> Result<Option<MintSupply>, ProviderError> {
    if let Some(err) = response.error {
        return Err(ProviderError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    let Some(value) = response.result.and_then(|result| result.value) else {
        return Ok(None);
    };
    match value.data {
        AccountData::Parsed { parsed } => {
            let raw_supply = parsed.info.supply.parse::<u128>().map_err(|err| {
                ProviderError::Decode(format!("supply `{}`: {err}", parsed.info.supply))
            })?;
            Ok(Some(MintSupply {
                decimals: parsed.info.decimals,
                raw_supply,
            }))
        }
        AccountData::Other(_) => Ok(None),
    }
}

pub struct HttpPriceProvider {
    client: Client,
    base_url: String,
}

impl HttpPriceProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    async fn prices(&self, ids: &[String]) -> Result<HashMap<String, f64>, ProviderError> {
        let response: PriceResponse = self
            .client
            .get(&self.base_url)
            .query(&[("ids", ids.join(","))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(collect_prices(response))
    }
}

fn collect_prices(response: PriceResponse) -> HashMap<String, f64> {
    response
        .data
        .into_iter()
        .filter_map(|(id, entry)| entry.price.map(|price| (id, price)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_response(raw: serde_json::Value) -> JsonRpcResponse<AccountInfoResult> {
        serde_json::from_value(raw).expect("valid rpc envelope")
    }

    #[test]
    fn decodes_parsed_mint_account() {
        let response = account_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1 },
                "value": {
                    "data": {
                        "parsed": {
                            "info": {
                                "decimals": 6,
                                "supply": "1000000000",
                                "isInitialized": true,
                                "mintAuthority": null
                            },
                            "type": "mint"
                        },
                        "program": "spl-token",
                        "space": 82
                    },
                    "executable": false,
                    "lamports": 1461600,
                    "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
                }
            }
        }));
        let supply = decode_account_info(response).unwrap().unwrap();
        assert_eq!(supply.decimals, 6);
        assert_eq!(supply.raw_supply, 1_000_000_000);
    }

    #[test]
    fn rpc_envelopes_decode_as_owned_values() {
        fn owned<T: serde::de::DeserializeOwned>() {}
        owned::<JsonRpcResponse<AccountInfoResult>>();

        let response = account_response(json!({ "jsonrpc": "2.0", "id": 1 }));
        assert!(response.result.is_none());
        assert!(response.error.is_none());
        assert_eq!(decode_account_info(response).unwrap(), None);
    }

    #[test]
    fn missing_account_is_none() {
        let response = account_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "context": { "slot": 1 }, "value": null }
        }));
        assert_eq!(decode_account_info(response).unwrap(), None);
    }

    #[test]
    fn non_mint_account_is_none() {
        let response = account_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1 },
                "value": { "data": ["AQID", "base64"] }
            }
        }));
        assert_eq!(decode_account_info(response).unwrap(), None);
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let response = account_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid param" }
        }));
        assert_eq!(
            decode_account_info(response).unwrap_err(),
            ProviderError::Rpc {
                code: -32602,
                message: "Invalid param".into()
            }
        );
    }

    #[test]
    fn collects_only_priced_entries() {
        let response: PriceResponse = serde_json::from_value(json!({
            "data": {
                "mint-a": { "id": "mint-a", "mintSymbol": "AAA", "price": 2.5 },
                "SOL": { "id": "So11111111111111111111111111111111111111112", "price": 150.0 },
                "mint-b": { "id": "mint-b", "price": null }
            },
            "timeTaken": 0.001
        }))
        .unwrap();
        let prices = collect_prices(response);
        assert_eq!(prices.len(), 2);
        assert_eq!(prices["mint-a"], 2.5);
        assert_eq!(prices["SOL"], 150.0);
    }
}
