use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Success<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(code: u16, data: T) -> Self {
        Self {
            code,
            message: "success".to_string(),
            data,
        }
    }
}

/// Body of a business failure that still produced a finalized record.
#[derive(Debug, Serialize, Deserialize)]
pub struct Failed<T> {
    pub code: u16,
    pub message: String,
    pub status: String,
    pub data: T,
}

impl<T> Failed<T> {
    pub fn new(code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            status: "failed".to_string(),
            data,
        }
    }
}

/// Body of a failure without any record to show.
#[derive(Debug, Serialize, Deserialize)]
pub struct Errors {
    pub code: u16,
    pub messages: Vec<String>,
}

impl Errors {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            messages: vec![message.into()],
        }
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        /// Opening balance in minor units. Defaults to 0.
        #[serde(default)]
        pub balance: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: i32,
        pub user_id: i32,
        pub balance: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod product {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
        pub description: Option<String>,
        pub price: i64,
        pub availability: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: i32,
        pub name: String,
        pub description: Option<String>,
        pub price: i64,
        pub availability: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductList {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductListResponse {
        pub products: Vec<ProductView>,
        pub total: u64,
    }
}

pub mod transaction {
    use super::*;

    /// Request type accepted by `POST /api/v1/transactions`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        Purchase,
        Deposit,
        Withdraw,
        Transfer,
    }

    /// Body of `POST /api/v1/transactions`.
    ///
    /// Which optional fields are required depends on `transaction_type`:
    /// - `purchase`: `product_id`, `quantity`;
    /// - `deposit` and `withdraw`: `amount`;
    /// - `transfer`: `from_wallet_id`, `to_wallet_id`, `amount`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub transaction_type: TransactionType,
        pub from_wallet_id: Option<i32>,
        pub to_wallet_id: Option<i32>,
        pub product_id: Option<i32>,
        pub amount: Option<i64>,
        pub quantity: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    /// A transaction record as the boundary shows it.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: String,
        pub from_wallet_id: Option<i32>,
        pub to_wallet_id: Option<i32>,
        pub product_id: Option<i32>,
        pub quantity: Option<i32>,
        pub amount: i64,
        /// `purchase`, `deposit`, `withdrawal` or `transfer`.
        pub transaction_type: String,
        /// `pending`, `completed` or `failed`.
        pub transaction_status: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}
