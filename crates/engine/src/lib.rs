//! Ledger engine for a small storefront.
//!
//! Wallets hold balances, products hold price and stock, and every money
//! movement leaves a transaction record that goes `pending` → `completed` or
//! `failed`. [`Engine`] runs the workflows; [`TransactionService`] sits in
//! front of it and turns storage failures into [`DomainError`]s.

pub use commands::{DepositCmd, PurchaseCmd, TransactionRequest, TransferCmd, WithdrawCmd};
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder, Settled};
pub use products::{NewProduct, Product};
pub use service::{
    CK_PRODUCTS_AVAILABILITY, CK_WALLETS_BALANCE, CODE_CREATED, CODE_DUPLICATED,
    CODE_FAILED_SERVER, CODE_FAILED_USER, CODE_NOT_FOUND, CODE_SUCCESS, CODE_TIMEOUT,
    CONSTRAINT_ERRORS, DomainError, Receipt, Rejection, TransactionService, validate,
};
pub use store::{ProductStore, TransactionStore, WalletStore};
pub use transactions::{
    FinalStatus, NewTransactionRecord, TransactionKind, TransactionRecord, TransactionStatus,
};
pub use wallets::{Wallet, WalletSelector};

mod commands;
mod error;
mod ops;
mod products;
mod service;
mod store;
mod transactions;
mod users;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
