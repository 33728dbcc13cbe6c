use sea_orm::sea_query::{ColumnDef, Expr, Index, IndexCreateStatement, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};

use crate::entity::{monitored_tokens, txn_signatures};
use buy_alert_domain::storage::{StorageError, StorageResult};

pub async fn run_migrations(db: &DatabaseConnection) -> StorageResult<()> {
    let backend = db.get_database_backend();

    let signatures_table = Table::create()
        .table(txn_signatures::Entity)
        .col(
            ColumnDef::new(txn_signatures::Column::Signature)
                .string_len(128)
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(txn_signatures::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned();
    create_table(db, backend, signatures_table).await?;

    let tokens_table = Table::create()
        .table(monitored_tokens::Entity)
        .col(
            ColumnDef::new(monitored_tokens::Column::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(
            ColumnDef::new(monitored_tokens::Column::TokenMint)
                .string_len(64)
                .not_null(),
        )
        .col(
            ColumnDef::new(monitored_tokens::Column::DestinationId)
                .string_len(64)
                .not_null(),
        )
        .col(ColumnDef::new(monitored_tokens::Column::Image).string().not_null())
        .col(ColumnDef::new(monitored_tokens::Column::Name).string().not_null())
        .col(ColumnDef::new(monitored_tokens::Column::Symbol).string().not_null())
        .col(
            ColumnDef::new(monitored_tokens::Column::MinValue)
                .double()
                .not_null(),
        )
        .col(
            ColumnDef::new(monitored_tokens::Column::MinValueEmojis)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(monitored_tokens::Column::DexTUrl)
                .string()
                .not_null(),
        )
        .to_owned();
    create_table(db, backend, tokens_table).await?;

    let mint_index = Index::create()
        .name("idx_monitored_tokens_mint")
        .table(monitored_tokens::Entity)
        .col(monitored_tokens::Column::TokenMint)
        .to_owned();
    create_index(db, backend, mint_index).await?;

    Ok(())
}

async fn create_table(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: TableCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: IndexCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}
