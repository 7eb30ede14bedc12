use chrono::Utc;
use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, FinalStatus, NewTransactionRecord, ResultEngine, TransactionRecord,
    TransactionStatus, transactions,
};

use super::{TransactionStore, with_tx};

impl TransactionStore {
    /// Write the intent record. The row always starts as `pending`.
    pub async fn create(&self, params: &NewTransactionRecord) -> ResultEngine<TransactionRecord> {
        let id = Uuid::new_v4();
        let model = transactions::ActiveModel::pending(id, params, Utc::now())
            .insert(&self.database)
            .await?;
        TransactionRecord::try_from(model)
    }

    /// Write the outcome of a pending record.
    ///
    /// This is a plain status/amount write: no business rule is checked. The
    /// row must still be `pending`; a terminal record fails with
    /// [`EngineError::InvalidTransition`] and a missing one with
    /// [`EngineError::KeyNotFound`].
    pub async fn finalize(
        &self,
        id: Uuid,
        final_amount: i64,
        status: FinalStatus,
    ) -> ResultEngine<TransactionRecord> {
        let status = TransactionStatus::from(status);
        with_tx!(self, |db_tx| {
            let updated = transactions::Entity::update_many()
                .col_expr(transactions::Column::Amount, Expr::value(final_amount))
                .col_expr(transactions::Column::TStatus, Expr::value(status.as_str()))
                .filter(transactions::Column::Id.eq(id.to_string()))
                .filter(transactions::Column::TStatus.eq(TransactionStatus::Pending.as_str()))
                .exec(&db_tx)
                .await?;

            let model = transactions::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {id}")))?;
            if updated.rows_affected == 0 {
                return Err(EngineError::InvalidTransition(format!(
                    "transaction {id} is already {}",
                    model.t_status
                )));
            }
            TransactionRecord::try_from(model)
        })
    }

    pub async fn get(&self, id: Uuid) -> ResultEngine<TransactionRecord> {
        let model = transactions::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("transaction {id}")))?;
        TransactionRecord::try_from(model)
    }

    /// Records where `wallet_id` is the source or the destination, newest first.
    pub async fn list_for_wallet(
        &self,
        wallet_id: i32,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<Vec<TransactionRecord>> {
        transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::FromWalletId.eq(wallet_id))
                    .add(transactions::Column::ToWalletId.eq(wallet_id)),
            )
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.database)
            .await?
            .into_iter()
            .map(TransactionRecord::try_from)
            .collect()
    }
}
