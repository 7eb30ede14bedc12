//! Wallets API endpoints.

use api_types::{
    Success,
    wallet::{WalletNew, WalletView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::Wallet;

use crate::{
    ServerError,
    server::{Caller, ServerState},
};

fn view(wallet: Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        user_id: wallet.user_id,
        balance: wallet.balance,
        created_at: wallet.created_at,
        updated_at: wallet.updated_at,
    }
}

pub async fn wallet_new(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<Success<WalletView>>), ServerError> {
    let wallet = state.service.open_wallet(user_id, payload.balance).await?;

    Ok((
        StatusCode::CREATED,
        Json(Success::new(engine::CODE_CREATED, view(wallet))),
    ))
}

pub async fn get(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<Success<WalletView>>, ServerError> {
    let wallet = state.service.wallet(user_id).await?;

    Ok(Json(Success::new(engine::CODE_SUCCESS, view(wallet))))
}
