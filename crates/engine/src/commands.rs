//! Command structs for engine workflows.
//!
//! A [`TransactionRequest`] is one user intent. Each variant carries exactly
//! the payload its workflow needs, and the engine dispatches on it with a
//! plain `match`.

use crate::TransactionKind;

/// Buy `quantity` units of a product with the caller's wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseCmd {
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(user_id: i32, product_id: i32, quantity: i32) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
        }
    }
}

/// Add `amount` to the caller's wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositCmd {
    pub user_id: i32,
    pub amount: i64,
}

impl DepositCmd {
    #[must_use]
    pub fn new(user_id: i32, amount: i64) -> Self {
        Self { user_id, amount }
    }
}

/// Take `amount` out of the caller's wallet.
///
/// `amount` is the positive magnitude; the engine applies it as a negative
/// delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawCmd {
    pub user_id: i32,
    pub amount: i64,
}

impl WithdrawCmd {
    #[must_use]
    pub fn new(user_id: i32, amount: i64) -> Self {
        Self { user_id, amount }
    }
}

/// Move `amount` from the caller's wallet to another wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferCmd {
    pub user_id: i32,
    pub from_wallet_id: i32,
    pub to_wallet_id: i32,
    pub amount: i64,
}

impl TransferCmd {
    #[must_use]
    pub fn new(user_id: i32, from_wallet_id: i32, to_wallet_id: i32, amount: i64) -> Self {
        Self {
            user_id,
            from_wallet_id,
            to_wallet_id,
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionRequest {
    Purchase(PurchaseCmd),
    Deposit(DepositCmd),
    Withdraw(WithdrawCmd),
    Transfer(TransferCmd),
}

impl TransactionRequest {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Purchase(_) => TransactionKind::Purchase,
            Self::Deposit(_) => TransactionKind::Deposit,
            Self::Withdraw(_) => TransactionKind::Withdrawal,
            Self::Transfer(_) => TransactionKind::Transfer,
        }
    }

    /// The authenticated user the request was issued for.
    pub fn user_id(&self) -> i32 {
        match self {
            Self::Purchase(cmd) => cmd.user_id,
            Self::Deposit(cmd) => cmd.user_id,
            Self::Withdraw(cmd) => cmd.user_id,
            Self::Transfer(cmd) => cmd.user_id,
        }
    }
}

impl From<PurchaseCmd> for TransactionRequest {
    fn from(value: PurchaseCmd) -> Self {
        Self::Purchase(value)
    }
}

impl From<DepositCmd> for TransactionRequest {
    fn from(value: DepositCmd) -> Self {
        Self::Deposit(value)
    }
}

impl From<WithdrawCmd> for TransactionRequest {
    fn from(value: WithdrawCmd) -> Self {
        Self::Withdraw(value)
    }
}

impl From<TransferCmd> for TransactionRequest {
    fn from(value: TransferCmd) -> Self {
        Self::Transfer(value)
    }
}
