// Wire types for the Solana JSON-RPC account lookup and the HTTP price feed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: T,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// `getAccountInfo` result with `jsonParsed` encoding. `value` is `null` when
/// the account does not exist.
#[derive(Debug, Deserialize)]
pub struct AccountInfoResult {
    pub value: Option<AccountValue>,
}

#[derive(Debug, Deserialize)]
pub struct AccountValue {
    pub data: AccountData,
}

/// Mint accounts decode as `Parsed`; anything else (raw base64, token
/// accounts, program accounts) lands in `Other`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AccountData {
    Parsed { parsed: ParsedMint },
    Other(Value),
}

#[derive(Debug, Deserialize)]
pub struct ParsedMint {
    pub info: MintInfo,
}

#[derive(Debug, Deserialize)]
pub struct MintInfo {
    pub decimals: u8,
    /// Raw integer supply encoded as a decimal string.
    pub supply: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PriceResponse {
    #[serde(default)]
    pub data: HashMap<String, PriceEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PriceEntry {
    #[serde(default)]
    pub price: Option<f64>,
}
