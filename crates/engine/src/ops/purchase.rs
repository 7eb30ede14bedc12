use tokio::time::Instant;

use crate::{
    EngineError, NewTransactionRecord, PurchaseCmd, ResultEngine, TransactionKind, WalletSelector,
};

use super::{Engine, Mutation, Progress, Settled};

/// `price × quantity`, refusing to wrap.
pub(crate) fn purchase_amount(price: i64, quantity: i32) -> ResultEngine<i64> {
    price.checked_mul(i64::from(quantity)).ok_or_else(|| {
        EngineError::InvalidAmount(format!(
            "purchase amount overflows: {price} x {quantity}"
        ))
    })
}

impl Engine {
    /// Buy `cmd.quantity` units of a product.
    ///
    /// A missing product is reported before any record is written. The
    /// amount is only settled once phase 2 has re-read the price, so the
    /// intent record starts with amount 0. Stock is taken first, then the
    /// wallet is charged; the two are independent atomic mutations, so a stock
    /// failure and a balance failure stay distinguishable. A balance failure
    /// does not give the stock back.
    pub(crate) async fn purchase(
        &self,
        cmd: PurchaseCmd,
        deadline: Option<Instant>,
    ) -> ResultEngine<Settled> {
        let wallet = self.wallets.get_by_user_id(cmd.user_id).await?;
        self.products.get_by_id(cmd.product_id).await?;
        let intent = NewTransactionRecord::new(TransactionKind::Purchase, 0)
            .from_wallet(wallet.id)
            .product(cmd.product_id, cmd.quantity);

        let progress = Progress::new(0);
        self.run_phases(
            intent,
            deadline,
            &progress,
            self.purchase_mutation(&cmd, &progress),
        )
        .await
    }

    async fn purchase_mutation(&self, cmd: &PurchaseCmd, progress: &Progress) -> Mutation {
        let product = match self.products.get_by_id(cmd.product_id).await {
            Ok(product) => product,
            Err(err) => return Mutation::failed(0, err),
        };
        let amount = match purchase_amount(product.price, cmd.quantity) {
            Ok(amount) => amount,
            Err(err) => return Mutation::failed(0, err),
        };
        progress.record(amount);

        if let Err(err) = self
            .products
            .apply_availability_delta(cmd.product_id, -cmd.quantity)
            .await
        {
            return Mutation::failed(amount, err);
        }

        let charged = self
            .wallets
            .apply_delta(WalletSelector::User(cmd.user_id), -amount)
            .await;
        Mutation::from_result(amount, charged)
    }
}
