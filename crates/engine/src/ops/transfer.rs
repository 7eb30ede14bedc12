use tokio::time::Instant;

use crate::{
    EngineError, NewTransactionRecord, ResultEngine, TransactionKind, TransferCmd, WalletSelector,
};

use super::{Engine, Mutation, Progress, Settled};

impl Engine {
    /// Move `cmd.amount` from `cmd.from_wallet_id` to `cmd.to_wallet_id`.
    ///
    /// The source must belong to the caller. The debit and the credit are two
    /// independent atomic mutations: when the debit fails the credit is never
    /// attempted, and when the credit fails the debit stays applied while the
    /// record is finalized as `failed`. The engine does not refund the source.
    pub(crate) async fn transfer(
        &self,
        cmd: TransferCmd,
        deadline: Option<Instant>,
    ) -> ResultEngine<Settled> {
        let source = self.wallets.get_by_wallet_id(cmd.from_wallet_id).await?;
        if source.user_id != cmd.user_id {
            return Err(EngineError::KeyNotFound(format!(
                "wallet {}",
                cmd.from_wallet_id
            )));
        }

        let debit = cmd.amount.checked_neg().ok_or_else(|| {
            EngineError::InvalidAmount(format!("cannot transfer {}", cmd.amount))
        })?;

        let intent = NewTransactionRecord::new(TransactionKind::Transfer, cmd.amount)
            .from_wallet(cmd.from_wallet_id)
            .to_wallet(cmd.to_wallet_id);

        let progress = Progress::new(cmd.amount);
        let mutation = async {
            if let Err(err) = self
                .wallets
                .apply_delta(WalletSelector::Wallet(cmd.from_wallet_id), debit)
                .await
            {
                return Mutation::failed(cmd.amount, err);
            }

            let credited = self
                .wallets
                .apply_delta(WalletSelector::Wallet(cmd.to_wallet_id), cmd.amount)
                .await;
            if credited.is_err() {
                tracing::warn!(
                    from = cmd.from_wallet_id,
                    to = cmd.to_wallet_id,
                    amount = cmd.amount,
                    "transfer credit failed after the debit was applied"
                );
            }
            Mutation::from_result(cmd.amount, credited)
        };
        self.run_phases(intent, deadline, &progress, mutation)
            .await
    }
}
