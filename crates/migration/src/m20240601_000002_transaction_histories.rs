use sea_orm::{ConnectionTrait, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum TransactionHistories {
    Table,
    FromWalletId,
    ToWalletId,
    TStatus,
    CreatedAt,
}

// Rows are written as `pending` and finalized exactly once.
const CREATE_TRANSACTION_HISTORIES: &str = r#"
CREATE TABLE IF NOT EXISTS transaction_histories (
    id TEXT NOT NULL PRIMARY KEY,
    from_wallet_id INTEGER,
    to_wallet_id INTEGER,
    product_id INTEGER,
    amount BIGINT NOT NULL,
    quantity INTEGER,
    t_type TEXT NOT NULL,
    t_status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    CONSTRAINT ck_transaction_histories_quantity CHECK (quantity IS NULL OR quantity > 0),
    CONSTRAINT ck_transaction_histories_t_type
        CHECK (t_type IN ('purchase', 'deposit', 'withdrawal', 'transfer')),
    CONSTRAINT ck_transaction_histories_t_status
        CHECK (t_status IN ('pending', 'completed', 'failed')),
    CONSTRAINT fk_transaction_histories_from_wallet_id
        FOREIGN KEY (from_wallet_id) REFERENCES wallets (id),
    CONSTRAINT fk_transaction_histories_to_wallet_id
        FOREIGN KEY (to_wallet_id) REFERENCES wallets (id),
    CONSTRAINT fk_transaction_histories_product_id
        FOREIGN KEY (product_id) REFERENCES products (id)
);
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            CREATE_TRANSACTION_HISTORIES.to_string(),
        ))
        .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_histories-from_wallet_id")
                    .table(TransactionHistories::Table)
                    .col(TransactionHistories::FromWalletId)
                    .col(TransactionHistories::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_histories-to_wallet_id")
                    .table(TransactionHistories::Table)
                    .col(TransactionHistories::ToWalletId)
                    .col(TransactionHistories::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_histories-t_status")
                    .table(TransactionHistories::Table)
                    .col(TransactionHistories::TStatus)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TransactionHistories::Table)
                    .to_owned(),
            )
            .await
    }
}
