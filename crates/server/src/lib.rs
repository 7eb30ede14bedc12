use api_types::{Errors, Failed};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{DomainError, EngineError, Rejection};

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod products;
mod server;
mod transactions;
mod wallets;

pub mod types {
    pub mod wallet {
        pub use api_types::wallet::{WalletNew, WalletView};
    }

    pub mod product {
        pub use api_types::product::{ProductList, ProductListResponse, ProductNew, ProductView};
    }

    pub mod transaction {
        pub use api_types::transaction::{
            TransactionList, TransactionListResponse, TransactionNew, TransactionType,
            TransactionView,
        };
    }
}

/// Default page size of list endpoints.
const DEFAULT_LIMIT: u64 = 50;
/// Largest page a caller may ask for.
const MAX_LIMIT: u64 = 200;

fn page_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub enum ServerError {
    Rejected(Rejection),
    Generic(String),
}

fn status_for_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServerError::Rejected(Rejection {
                record: Some(record),
                error,
            }) => {
                let code = error.status_code();
                let body = Failed::new(code, error.to_string(), transactions::view(record));
                (status_for_code(code), Json(body)).into_response()
            }
            ServerError::Rejected(Rejection {
                record: None,
                error,
            }) => {
                let code = error.status_code();
                (status_for_code(code), Json(Errors::new(code, error.to_string())))
                    .into_response()
            }
            ServerError::Generic(err) => {
                let code = StatusCode::BAD_REQUEST;
                (code, Json(Errors::new(code.as_u16(), err))).into_response()
            }
        }
    }
}

impl From<Rejection> for ServerError {
    fn from(value: Rejection) -> Self {
        Self::Rejected(value)
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        let error = DomainError::classify(&value);
        if error.status_code() >= 500 {
            tracing::error!("engine failure: {value}");
        }
        Self::Rejected(Rejection {
            record: None,
            error,
        })
    }
}
