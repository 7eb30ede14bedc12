use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{products, transactions, wallets};
use engine::TransactionService;

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub service: Arc<TransactionService>,
}

/// The authenticated caller, as vouched for by the identity provider.
#[derive(Clone, Copy, Debug)]
pub struct Caller(pub i32);

/// `TypedHeader` for the caller's user id.
///
/// The identity provider in front of the server puts the authenticated user
/// id in "x-user-id". It is trusted as is.
#[derive(Debug)]
struct UserIdHeader(i32);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let Ok(value) = value.trim().parse() else {
            return Err(AxumError::invalid());
        };

        Ok(UserIdHeader(value))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        values.extend(std::iter::once(axum::http::HeaderValue::from(self.0)));
    }
}

async fn auth(
    user_header: Option<TypedHeader<UserIdHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(Caller(user_id));
    Ok(next.run(request).await)
}

/// The HTTP API, ready to be served.
pub fn router(service: TransactionService) -> Router {
    let state = ServerState {
        service: Arc::new(service),
    };

    Router::new()
        .route(
            "/api/v1/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/api/v1/wallets",
            post(wallets::wallet_new).get(wallets::get),
        )
        .route(
            "/api/v1/products",
            post(products::product_new).get(products::list),
        )
        .route("/api/v1/products/{id}", get(products::get))
        .route_layer(middleware::from_fn(auth))
        .with_state(state)
}

pub async fn run(service: TransactionService, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(service, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    service: TransactionService,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(service)).await
}

pub fn spawn_with_listener(
    service: TransactionService,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(service, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
