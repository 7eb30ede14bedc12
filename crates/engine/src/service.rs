//! The transaction service.
//!
//! A thin policy layer in front of [`Engine`]:
//!
//! - caller input that is obviously out of range is rejected before the
//!   engine writes any record;
//! - engine and storage errors are translated into [`DomainError`], each with
//!   a fixed HTTP-style status code.
//!
//! Check constraints are told apart by name through [`CONSTRAINT_ERRORS`];
//! driver message wording never takes part in the decision.

use thiserror::Error;

use crate::{
    DepositCmd, Engine, EngineError, PurchaseCmd, Settled, TransactionRecord, TransactionRequest,
    TransferCmd, Wallet, WithdrawCmd,
};

pub const CODE_SUCCESS: u16 = 200;
pub const CODE_CREATED: u16 = 201;
pub const CODE_FAILED_USER: u16 = 400;
pub const CODE_NOT_FOUND: u16 = 404;
pub const CODE_DUPLICATED: u16 = 409;
pub const CODE_FAILED_SERVER: u16 = 500;
pub const CODE_TIMEOUT: u16 = 504;

/// Name of the check constraint keeping wallet balances non-negative.
pub const CK_WALLETS_BALANCE: &str = "ck_wallets_balance";
/// Name of the check constraint keeping product stock non-negative.
pub const CK_PRODUCTS_AVAILABILITY: &str = "ck_products_availability";

/// Domain error for each named check constraint with a dedicated meaning.
///
/// Constraints not listed here fall back to
/// [`DomainError::ConstraintViolation`].
pub static CONSTRAINT_ERRORS: [(&str, DomainError); 2] = [
    (CK_WALLETS_BALANCE, DomainError::InsufficientBalance),
    (CK_PRODUCTS_AVAILABILITY, DomainError::InsufficientStock),
];

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("no data found: {0}")]
    NotFound(String),
    #[error("balance is insufficient")]
    InsufficientBalance,
    #[error("product stock is insufficient")]
    InsufficientStock,
    #[error("input references data that does not exist")]
    ReferenceViolation,
    #[error("duplicate data")]
    Duplicate,
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("transaction outcome could not be recorded")]
    FatalEngine,
    #[error("database error occurred")]
    Infrastructure,
}

impl DomainError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InsufficientBalance
            | Self::InsufficientStock
            | Self::ReferenceViolation
            | Self::ConstraintViolation(_) => CODE_FAILED_USER,
            Self::NotFound(_) => CODE_NOT_FOUND,
            Self::Duplicate => CODE_DUPLICATED,
            Self::DeadlineExceeded => CODE_TIMEOUT,
            Self::FatalEngine | Self::Infrastructure => CODE_FAILED_SERVER,
        }
    }

    /// Map an engine error onto the domain taxonomy.
    pub fn classify(err: &EngineError) -> Self {
        match err {
            EngineError::InvalidAmount(msg) => Self::Validation(msg.clone()),
            EngineError::KeyNotFound(what) => Self::NotFound(what.clone()),
            EngineError::ExistingKey(_) => Self::Duplicate,
            EngineError::CheckViolation { constraint } => constraint_error(constraint),
            EngineError::ForeignKeyViolation(_) => Self::ReferenceViolation,
            EngineError::NotNullViolation(column) => Self::ConstraintViolation(column.clone()),
            EngineError::DeadlineExceeded(_) => Self::DeadlineExceeded,
            EngineError::InvalidTransition(_) | EngineError::Finalize { .. } => Self::FatalEngine,
            EngineError::Database(_) => Self::Infrastructure,
        }
    }
}

fn constraint_error(constraint: &str) -> DomainError {
    CONSTRAINT_ERRORS
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, error)| error.clone())
        .unwrap_or_else(|| DomainError::ConstraintViolation(constraint.to_string()))
}

/// A completed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub record: TransactionRecord,
    pub code: u16,
}

/// A request the service could not complete.
///
/// `record` is present whenever the engine got as far as writing one; it is
/// then finalized as `failed`.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{error}")]
pub struct Rejection {
    pub record: Option<TransactionRecord>,
    pub error: DomainError,
}

impl Rejection {
    fn without_record(error: DomainError) -> Self {
        Self {
            record: None,
            error,
        }
    }

    pub fn code(&self) -> u16 {
        self.error.status_code()
    }
}

/// Reject requests whose inputs can never succeed.
pub fn validate(request: &TransactionRequest) -> Result<(), DomainError> {
    let invalid = |msg: &str| Err(DomainError::Validation(msg.to_string()));
    match request {
        TransactionRequest::Purchase(cmd) if cmd.quantity <= 0 => {
            invalid("quantity must be more than 0")
        }
        TransactionRequest::Deposit(cmd) if cmd.amount <= 0 => invalid("amount must be more than 0"),
        TransactionRequest::Withdraw(cmd) if cmd.amount <= 0 => {
            invalid("amount must be more than 0")
        }
        TransactionRequest::Transfer(cmd) if cmd.amount == 0 => invalid("amount must not be 0"),
        TransactionRequest::Transfer(cmd) if cmd.from_wallet_id == cmd.to_wallet_id => {
            invalid("from_wallet_id and to_wallet_id must differ")
        }
        _ => Ok(()),
    }
}

#[derive(Clone, Debug)]
pub struct TransactionService {
    engine: Engine,
}

impl TransactionService {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub async fn execute(&self, request: TransactionRequest) -> Result<Receipt, Rejection> {
        if let Err(error) = validate(&request) {
            tracing::debug!(kind = request.kind().as_str(), "rejected request: {error}");
            return Err(Rejection::without_record(error));
        }

        match self.engine.execute(request).await {
            Ok(Settled {
                record,
                failure: None,
            }) => Ok(Receipt {
                record,
                code: CODE_SUCCESS,
            }),
            Ok(Settled {
                record,
                failure: Some(err),
            }) => Err(reject(Some(record), &err)),
            Err(err) => Err(reject(None, &err)),
        }
    }

    pub async fn purchase(&self, cmd: PurchaseCmd) -> Result<Receipt, Rejection> {
        self.execute(cmd.into()).await
    }

    pub async fn deposit(&self, cmd: DepositCmd) -> Result<Receipt, Rejection> {
        self.execute(cmd.into()).await
    }

    pub async fn withdraw(&self, cmd: WithdrawCmd) -> Result<Receipt, Rejection> {
        self.execute(cmd.into()).await
    }

    pub async fn transfer(&self, cmd: TransferCmd) -> Result<Receipt, Rejection> {
        self.execute(cmd.into()).await
    }

    /// Provision the caller's wallet.
    pub async fn open_wallet(&self, user_id: i32, balance: i64) -> Result<Wallet, Rejection> {
        if balance < 0 {
            return Err(Rejection::without_record(DomainError::Validation(
                "balance must not be negative".to_string(),
            )));
        }
        self.engine
            .wallets()
            .create(user_id, balance)
            .await
            .map_err(|err| reject(None, &err))
    }

    pub async fn wallet(&self, user_id: i32) -> Result<Wallet, Rejection> {
        self.engine
            .wallets()
            .get_by_user_id(user_id)
            .await
            .map_err(|err| reject(None, &err))
    }

    /// Transaction history of the caller's wallet, newest first.
    pub async fn history(
        &self,
        user_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<TransactionRecord>, Rejection> {
        let wallet = self.wallet(user_id).await?;
        self.engine
            .records()
            .list_for_wallet(wallet.id, limit, offset)
            .await
            .map_err(|err| reject(None, &err))
    }
}

fn reject(record: Option<TransactionRecord>, err: &EngineError) -> Rejection {
    let error = DomainError::classify(err);
    match &error {
        DomainError::FatalEngine | DomainError::Infrastructure => {
            tracing::error!("transaction service failure: {err}");
        }
        _ => tracing::info!(code = error.status_code(), "transaction rejected: {err}"),
    }
    Rejection { record, error }
}
