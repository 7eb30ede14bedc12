use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{EngineError, ResultEngine, Wallet, WalletSelector, wallets};

use super::{WalletStore, with_tx};

impl WalletStore {
    /// Provision the wallet of `user_id` with an opening balance.
    ///
    /// A user owns at most one wallet; a second call fails with
    /// [`EngineError::ExistingKey`]. A negative opening balance is rejected by
    /// the `ck_wallets_balance` constraint.
    pub async fn create(&self, user_id: i32, initial_balance: i64) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let exists = wallets::Entity::find()
                .filter(wallets::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(format!("wallet of user {user_id}")));
            }

            let model = wallets::ActiveModel::new_for_user(user_id, initial_balance, Utc::now())
                .insert(&db_tx)
                .await?;
            tracing::debug!(wallet_id = model.id, user_id, "wallet created");
            Ok(Wallet::from(model))
        })
    }

    pub async fn get_by_user_id(&self, user_id: i32) -> ResultEngine<Wallet> {
        self.get(WalletSelector::User(user_id)).await
    }

    pub async fn get_by_wallet_id(&self, wallet_id: i32) -> ResultEngine<Wallet> {
        self.get(WalletSelector::Wallet(wallet_id)).await
    }

    async fn get(&self, selector: WalletSelector) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find()
            .filter(selector.condition())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(selector.describe()))?;
        Ok(Wallet::from(model))
    }

    /// Add `amount` (positive or negative) to the selected wallet's balance.
    ///
    /// The sum is computed by the storage engine, so concurrent deltas on the
    /// same wallet serialize without lost updates. A result below zero fails
    /// with a `ck_wallets_balance` [`EngineError::CheckViolation`] and leaves
    /// the balance untouched.
    pub async fn apply_delta(&self, selector: WalletSelector, amount: i64) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let updated = wallets::Entity::update_many()
                .col_expr(
                    wallets::Column::Balance,
                    Expr::col(wallets::Column::Balance).add(amount),
                )
                .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(selector.condition())
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(selector.describe()));
            }

            let model = wallets::Entity::find()
                .filter(selector.condition())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(selector.describe()))?;
            Ok(Wallet::from(model))
        })
    }
}
