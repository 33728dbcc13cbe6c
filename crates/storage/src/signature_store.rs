use buy_alert_domain::storage::{SignatureStore, StorageError, StorageResult};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DbErr, EntityTrait, Set, SqlErr};

use crate::entity::txn_signatures;
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl SignatureStore for SeaOrmStorage {
    async fn insert_if_absent(&self, signature: &str) -> StorageResult<bool> {
        let model = txn_signatures::ActiveModel {
            signature: Set(signature.to_owned()),
            created_at: Set(Utc::now()),
        };
        let result = txn_signatures::Entity::insert(model)
            .on_conflict(
                OnConflict::column(txn_signatures::Column::Signature)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.connection())
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(err) => Err(StorageError::from_source(err)),
        }
    }
}

fn is_duplicate_key(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || matches!(err, DbErr::RecordNotInserted)
}
