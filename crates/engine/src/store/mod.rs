//! Stores owning the mutable aggregates.
//!
//! Each store wraps a clone of the injected [`DatabaseConnection`] and runs
//! every public operation inside its own DB transaction. Balance and stock
//! deltas are applied as `column = column + ?` so the read-modify-write
//! happens inside the storage engine, and the named check constraints reject
//! any result below zero.

use sea_orm::DatabaseConnection;

mod products;
mod transactions;
mod wallets;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Owns wallet balances.
#[derive(Clone, Debug)]
pub struct WalletStore {
    database: DatabaseConnection,
}

impl WalletStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

/// Owns product price and stock.
#[derive(Clone, Debug)]
pub struct ProductStore {
    database: DatabaseConnection,
}

impl ProductStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

/// Append-only store of transaction records.
#[derive(Clone, Debug)]
pub struct TransactionStore {
    database: DatabaseConnection,
}

impl TransactionStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}
