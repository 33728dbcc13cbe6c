use std::collections::HashSet;
use std::time::Duration;

use buy_alert_domain::model::{MonitoredToken, TokenChange};
use buy_alert_domain::storage::TokenRegistry;
use tokio::time::timeout;
use tracing::debug;

use crate::diff::TokenChanges;
use crate::worker::MonitorError;

/// A registry entry whose threshold the event's change satisfies.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub token: MonitoredToken,
    pub change: TokenChange,
}

/// Looks up registry entries for the changed mints and keeps those whose
/// threshold is met.
pub async fn find_candidates(
    registry: &dyn TokenRegistry,
    changes: &TokenChanges,
    io_timeout: Duration,
) -> Result<Vec<Candidate>, MonitorError> {
    let mints: HashSet<String> = changes.keys().cloned().collect();
    let entries = timeout(io_timeout, registry.find_by_mints(&mints))
        .await
        .map_err(|_| MonitorError::Timeout {
            operation: "registry_lookup",
        })??;
    Ok(apply_thresholds(entries, changes))
}

/// Each entry is judged on its own `min_value`; entries sharing a mint fan out.
pub fn apply_thresholds(entries: Vec<MonitoredToken>, changes: &TokenChanges) -> Vec<Candidate> {
    entries
        .into_iter()
        .filter_map(|token| {
            let change = *changes.get(&token.mint)?;
            if change.amount < token.min_value {
                debug!(
                    mint = %token.mint,
                    destination = %token.destination_id,
                    amount = change.amount,
                    min_value = token.min_value,
                    "change below destination threshold"
                );
                return None;
            }
            Some(Candidate { token, change })
        })
        .collect()
}
