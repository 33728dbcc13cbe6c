use std::collections::HashSet;

use buy_alert_domain::model::MonitoredToken;
use buy_alert_domain::storage::{StorageError, StorageResult, TokenRegistry};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::entity::monitored_tokens;
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl TokenRegistry for SeaOrmStorage {
    async fn find_by_mints(&self, mints: &HashSet<String>) -> StorageResult<Vec<MonitoredToken>> {
        if mints.is_empty() {
            return Ok(Vec::new());
        }
        let rows = monitored_tokens::Entity::find()
            .filter(monitored_tokens::Column::TokenMint.is_in(mints.iter().cloned()))
            .order_by_asc(monitored_tokens::Column::Id)
            .all(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(rows.into_iter().map(model_to_token).collect())
    }
}

fn model_to_token(model: monitored_tokens::Model) -> MonitoredToken {
    MonitoredToken {
        mint: model.token_mint,
        destination_id: model.destination_id,
        image: model.image,
        name: model.name,
        symbol: model.symbol,
        min_value: model.min_value,
        min_value_emojis: model.min_value_emojis,
        dex_t_url: model.dex_t_url,
    }
}
