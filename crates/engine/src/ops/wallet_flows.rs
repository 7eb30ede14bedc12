use tokio::time::Instant;

use crate::{
    DepositCmd, EngineError, NewTransactionRecord, ResultEngine, TransactionKind, WalletSelector,
    WithdrawCmd,
};

use super::{Engine, Mutation, Progress, Settled};

impl Engine {
    /// Credit the caller's wallet. `cmd.amount` is expected to be positive.
    pub(crate) async fn deposit(
        &self,
        cmd: DepositCmd,
        deadline: Option<Instant>,
    ) -> ResultEngine<Settled> {
        let wallet = self.wallets.get_by_user_id(cmd.user_id).await?;
        let intent =
            NewTransactionRecord::new(TransactionKind::Deposit, cmd.amount).to_wallet(wallet.id);

        let progress = Progress::new(cmd.amount);
        let mutation = async {
            let credited = self
                .wallets
                .apply_delta(WalletSelector::User(cmd.user_id), cmd.amount)
                .await;
            Mutation::from_result(cmd.amount, credited)
        };
        self.run_phases(intent, deadline, &progress, mutation)
            .await
    }

    /// Debit the caller's wallet.
    ///
    /// `cmd.amount` is the positive magnitude; it is negated here, and the
    /// record stores the negative amount.
    pub(crate) async fn withdraw(
        &self,
        cmd: WithdrawCmd,
        deadline: Option<Instant>,
    ) -> ResultEngine<Settled> {
        let wallet = self.wallets.get_by_user_id(cmd.user_id).await?;
        let amount = cmd.amount.checked_neg().ok_or_else(|| {
            EngineError::InvalidAmount(format!("cannot withdraw {}", cmd.amount))
        })?;
        let intent =
            NewTransactionRecord::new(TransactionKind::Withdrawal, amount).from_wallet(wallet.id);

        let progress = Progress::new(amount);
        let mutation = async {
            let debited = self
                .wallets
                .apply_delta(WalletSelector::User(cmd.user_id), amount)
                .await;
            Mutation::from_result(amount, debited)
        };
        self.run_phases(intent, deadline, &progress, mutation)
            .await
    }
}
