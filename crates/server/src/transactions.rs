//! Transactions API endpoints

use api_types::{
    Success,
    transaction::{
        TransactionList, TransactionListResponse, TransactionNew, TransactionType,
        TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{
    DepositCmd, PurchaseCmd, TransactionRecord, TransactionRequest, TransferCmd, WithdrawCmd,
};

use crate::{
    ServerError, page_limit,
    server::{Caller, ServerState},
};

pub(crate) fn view(record: TransactionRecord) -> TransactionView {
    TransactionView {
        id: record.id.to_string(),
        from_wallet_id: record.from_wallet_id,
        to_wallet_id: record.to_wallet_id,
        product_id: record.product_id,
        quantity: record.quantity,
        amount: record.amount,
        transaction_type: record.kind.as_str().to_string(),
        transaction_status: record.status.as_str().to_string(),
        created_at: record.created_at,
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ServerError> {
    value.ok_or_else(|| ServerError::Generic(format!("{field} is required")))
}

/// Turn the wire request into an engine request for `user_id`.
fn to_request(user_id: i32, payload: TransactionNew) -> Result<TransactionRequest, ServerError> {
    let request = match payload.transaction_type {
        TransactionType::Purchase => PurchaseCmd::new(
            user_id,
            required(payload.product_id, "product_id")?,
            required(payload.quantity, "quantity")?,
        )
        .into(),
        TransactionType::Deposit => {
            DepositCmd::new(user_id, required(payload.amount, "amount")?).into()
        }
        TransactionType::Withdraw => {
            WithdrawCmd::new(user_id, required(payload.amount, "amount")?).into()
        }
        TransactionType::Transfer => TransferCmd::new(
            user_id,
            required(payload.from_wallet_id, "from_wallet_id")?,
            required(payload.to_wallet_id, "to_wallet_id")?,
            required(payload.amount, "amount")?,
        )
        .into(),
    };
    Ok(request)
}

pub async fn create(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<Json<Success<TransactionView>>, ServerError> {
    let request = to_request(user_id, payload)?;
    let receipt = state.service.execute(request).await?;

    Ok(Json(Success::new(receipt.code, view(receipt.record))))
}

pub async fn list(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Query(params): Query<TransactionList>,
) -> Result<Json<Success<TransactionListResponse>>, ServerError> {
    let records = state
        .service
        .history(
            user_id,
            page_limit(params.limit),
            params.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(Success::new(
        engine::CODE_SUCCESS,
        TransactionListResponse {
            transactions: records.into_iter().map(view).collect(),
        },
    )))
}
