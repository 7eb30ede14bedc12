//! Transaction records.
//!
//! A `TransactionRecord` is the audit row of one attempted ledger operation.
//! It is written as `pending` before any balance or stock moves and is
//! finalized exactly once to `completed` or `failed`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidTransition(format!(
                "unknown transaction status: {other}"
            ))),
        }
    }
}

/// Outcome written by the finalize step. Only terminal states are reachable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalStatus {
    Completed,
    Failed,
}

impl From<FinalStatus> for TransactionStatus {
    fn from(value: FinalStatus) -> Self {
        match value {
            FinalStatus::Completed => Self::Completed,
            FinalStatus::Failed => Self::Failed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub from_wallet_id: Option<i32>,
    pub to_wallet_id: Option<i32>,
    pub product_id: Option<i32>,
    /// Signed: negative for money leaving the wallet in single-wallet flows.
    pub amount: i64,
    pub quantity: Option<i32>,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Inputs captured by the intent record.
///
/// There is no status field: a new record is always `pending`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransactionRecord {
    pub from_wallet_id: Option<i32>,
    pub to_wallet_id: Option<i32>,
    pub product_id: Option<i32>,
    pub amount: i64,
    pub quantity: Option<i32>,
    pub kind: TransactionKind,
}

impl NewTransactionRecord {
    #[must_use]
    pub fn new(kind: TransactionKind, amount: i64) -> Self {
        Self {
            from_wallet_id: None,
            to_wallet_id: None,
            product_id: None,
            amount,
            quantity: None,
            kind,
        }
    }

    #[must_use]
    pub fn from_wallet(mut self, wallet_id: i32) -> Self {
        self.from_wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn to_wallet(mut self, wallet_id: i32) -> Self {
        self.to_wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn product(mut self, product_id: i32, quantity: i32) -> Self {
        self.product_id = Some(product_id);
        self.quantity = Some(quantity);
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_histories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub from_wallet_id: Option<i32>,
    pub to_wallet_id: Option<i32>,
    pub product_id: Option<i32>,
    pub amount: i64,
    pub quantity: Option<i32>,
    pub t_type: String,
    pub t_status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Product,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn pending(id: Uuid, params: &NewTransactionRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: ActiveValue::Set(id.to_string()),
            from_wallet_id: ActiveValue::Set(params.from_wallet_id),
            to_wallet_id: ActiveValue::Set(params.to_wallet_id),
            product_id: ActiveValue::Set(params.product_id),
            amount: ActiveValue::Set(params.amount),
            quantity: ActiveValue::Set(params.quantity),
            t_type: ActiveValue::Set(params.kind.as_str().to_string()),
            t_status: ActiveValue::Set(TransactionStatus::Pending.as_str().to_string()),
            created_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for TransactionRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            from_wallet_id: model.from_wallet_id,
            to_wallet_id: model.to_wallet_id,
            product_id: model.product_id,
            amount: model.amount,
            quantity: model.quantity,
            kind: TransactionKind::try_from(model.t_type.as_str())?,
            status: TransactionStatus::try_from(model.t_status.as_str())?,
            created_at: model.created_at,
        })
    }
}
