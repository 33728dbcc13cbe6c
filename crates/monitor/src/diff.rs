//! Balance diff engine: per-mint holding deltas of the transaction signer.
//!
//! Default-merge policy: a post-state balance with no pre-state record for the
//! same account index, and any `null` UI amount, is read as
//! [`MISSING_BALANCE`]. When the signer holds a mint in several accounts the
//! last post-state record wins.

use std::collections::HashMap;

use buy_alert_domain::model::{TokenBalance, TokenChange, TransactionEvent};

/// Amount assumed for an absent balance record or a `null` UI amount.
pub const MISSING_BALANCE: f64 = 0.0;

pub type TokenChanges = HashMap<String, TokenChange>;

pub fn ui_amount_or_default(balance: Option<&TokenBalance>) -> f64 {
    balance
        .and_then(|balance| balance.ui_token_amount.ui_amount)
        .unwrap_or(MISSING_BALANCE)
}

/// Computes the signer's token changes for a successfully executed event.
pub fn compute_token_changes(event: &TransactionEvent, signer: &str) -> TokenChanges {
    let mut pre_by_index: HashMap<u32, &TokenBalance> = HashMap::new();
    for balance in event.pre_token_balances() {
        pre_by_index.entry(balance.account_index).or_insert(balance);
    }

    let mut changes = TokenChanges::new();
    for post in event.post_token_balances() {
        if !post.is_owned_by(signer) {
            continue;
        }
        let pre_amount = ui_amount_or_default(pre_by_index.get(&post.account_index).copied());
        let post_amount = ui_amount_or_default(Some(post));

        if let Some(change) = TokenChange::between(pre_amount, post_amount) {
            changes.insert(post.mint.clone(), change);
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn balance(index: u32, owner: &str, mint: &str, amount: Option<f64>) -> Value {
        json!({
            "accountIndex": index,
            "owner": owner,
            "mint": mint,
            "uiTokenAmount": { "uiAmount": amount }
        })
    }

    fn sample_event(pre: Vec<Value>, post: Vec<Value>) -> TransactionEvent {
        serde_json::from_value(json!({
            "signature": "sig",
            "transaction": {
                "meta": { "err": null, "preTokenBalances": pre, "postTokenBalances": post },
                "transaction": {
                    "message": { "accountKeys": [{ "pubkey": "buyer", "signer": true }] }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn first_purchase_is_new_holder() {
        let event = sample_event(vec![], vec![balance(2, "buyer", "mint-a", Some(150.0))]);
        let changes = compute_token_changes(&event, "buyer");
        let change = changes["mint-a"];
        assert!(change.is_new_holder);
        assert_eq!(change.amount, 150.0);
        assert_eq!(change.position_increase, None);
    }

    #[test]
    fn top_up_reports_position_increase() {
        let event = sample_event(
            vec![balance(2, "buyer", "mint-a", Some(200.0))],
            vec![balance(2, "buyer", "mint-a", Some(250.0))],
        );
        let change = compute_token_changes(&event, "buyer")["mint-a"];
        assert!(!change.is_new_holder);
        assert_eq!(change.amount, 50.0);
        assert_eq!(change.position_increase, Some(25.0));
    }

    #[test]
    fn ignores_balances_owned_by_others() {
        let event = sample_event(
            vec![balance(3, "pool", "mint-a", Some(1_000.0))],
            vec![
                balance(3, "pool", "mint-a", Some(900.0)),
                balance(4, "buyer", "mint-b", Some(5.0)),
            ],
        );
        let changes = compute_token_changes(&event, "buyer");
        assert_eq!(changes.len(), 1);
        assert!(changes.contains_key("mint-b"));
    }

    #[test]
    fn unchanged_balances_are_skipped() {
        let event = sample_event(
            vec![balance(2, "buyer", "mint-a", Some(10.0))],
            vec![balance(2, "buyer", "mint-a", Some(10.0))],
        );
        assert!(compute_token_changes(&event, "buyer").is_empty());
    }

    #[test]
    fn null_ui_amounts_read_as_zero() {
        let event = sample_event(
            vec![balance(2, "buyer", "mint-a", None)],
            vec![balance(2, "buyer", "mint-a", Some(3.0))],
        );
        let change = compute_token_changes(&event, "buyer")["mint-a"];
        assert!(change.is_new_holder);
        assert_eq!(change.amount, 3.0);

        let emptied = sample_event(
            vec![balance(2, "buyer", "mint-a", Some(0.0))],
            vec![balance(2, "buyer", "mint-a", None)],
        );
        assert!(compute_token_changes(&emptied, "buyer").is_empty());
    }

    #[test]
    fn pre_balance_is_matched_by_account_index() {
        let event = sample_event(
            vec![
                balance(5, "buyer", "mint-a", Some(100.0)),
                balance(2, "buyer", "mint-a", Some(40.0)),
            ],
            vec![balance(2, "buyer", "mint-a", Some(50.0))],
        );
        let change = compute_token_changes(&event, "buyer")["mint-a"];
        assert_eq!(change.amount, 10.0);
        assert_eq!(change.position_increase, Some(25.0));
    }

    #[test]
    fn sell_is_reported_as_absolute_delta() {
        let event = sample_event(
            vec![balance(2, "buyer", "mint-a", Some(80.0))],
            vec![balance(2, "buyer", "mint-a", Some(20.0))],
        );
        let change = compute_token_changes(&event, "buyer")["mint-a"];
        assert_eq!(change.amount, 60.0);
    }
}
