// Typed view of a parsed transaction notification. Only the fields the
// pipeline reads are modelled; everything else in the upstream payload is
// ignored by serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub signature: String,
    pub transaction: EventTransaction,
}

impl TransactionEvent {
    /// `true` when the transaction failed on chain.
    pub fn execution_failed(&self) -> bool {
        self.transaction.meta.err.is_some()
    }

    /// First account key flagged as a signer.
    pub fn signer(&self) -> Option<&str> {
        self.transaction
            .transaction
            .message
            .account_keys
            .iter()
            .find(|key| key.signer)
            .map(|key| key.pubkey.as_str())
    }

    pub fn pre_token_balances(&self) -> &[TokenBalance] {
        &self.transaction.meta.pre_token_balances
    }

    pub fn post_token_balances(&self) -> &[TokenBalance] {
        &self.transaction.meta.post_token_balances
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTransaction {
    pub meta: TransactionMeta,
    pub transaction: InnerTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    /// `null` and a missing field both mean the transaction succeeded.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerTransaction {
    pub message: EventMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub account_keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
    #[serde(default)]
    pub writable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: u32,
    #[serde(default)]
    pub owner: Option<String>,
    pub mint: String,
    pub ui_token_amount: UiTokenAmount,
}

impl TokenBalance {
    pub fn is_owned_by(&self, account: &str) -> bool {
        self.owner.as_deref() == Some(account)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub amount: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_event(err: Value) -> Value {
        json!({
            "signature": "sig-1",
            "transaction": {
                "meta": {
                    "err": err,
                    "preTokenBalances": [],
                    "postTokenBalances": [{
                        "accountIndex": 1,
                        "owner": "buyer",
                        "mint": "mint-a",
                        "uiTokenAmount": { "uiAmount": 10.0, "decimals": 6, "amount": "10000000" }
                    }]
                },
                "transaction": {
                    "message": {
                        "accountKeys": [
                            { "pubkey": "buyer", "signer": true, "writable": true },
                            { "pubkey": "ata", "signer": false, "writable": true }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn parses_upstream_payload() {
        let event: TransactionEvent = serde_json::from_value(raw_event(Value::Null)).unwrap();
        assert_eq!(event.signature, "sig-1");
        assert!(!event.execution_failed());
        assert_eq!(event.signer(), Some("buyer"));
        assert_eq!(event.post_token_balances()[0].ui_token_amount.ui_amount, Some(10.0));
        assert!(event.post_token_balances()[0].is_owned_by("buyer"));
    }

    #[test]
    fn flags_execution_errors() {
        let event: TransactionEvent =
            serde_json::from_value(raw_event(json!({ "InstructionError": [0, "Custom"] })))
                .unwrap();
        assert!(event.execution_failed());
    }

    #[test]
    fn missing_balance_arrays_default_to_empty() {
        let event: TransactionEvent = serde_json::from_value(json!({
            "signature": "sig-2",
            "transaction": {
                "meta": {},
                "transaction": { "message": { "accountKeys": [] } }
            }
        }))
        .unwrap();
        assert!(event.pre_token_balances().is_empty());
        assert!(event.post_token_balances().is_empty());
        assert_eq!(event.signer(), None);
    }

    #[test]
    fn rejects_wrongly_typed_balances() {
        let mut raw = raw_event(Value::Null);
        raw["transaction"]["meta"]["postTokenBalances"][0]["accountIndex"] = json!("one");
        assert!(serde_json::from_value::<TransactionEvent>(raw).is_err());
    }
}
