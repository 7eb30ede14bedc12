//! Product catalog endpoints.

use api_types::{
    Success,
    product::{ProductList, ProductListResponse, ProductNew, ProductView},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewProduct, Product};

use crate::{ServerError, page_limit, server::ServerState};

fn view(product: Product) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name,
        description: product.description,
        price: product.price,
        availability: product.availability,
    }
}

pub async fn product_new(
    State(state): State<ServerState>,
    Json(payload): Json<ProductNew>,
) -> Result<(StatusCode, Json<Success<ProductView>>), ServerError> {
    let mut product = NewProduct::new(payload.name, payload.price, payload.availability);
    if let Some(description) = payload.description {
        product = product.description(description);
    }
    let product = state.service.engine().products().create(&product).await?;

    Ok((
        StatusCode::CREATED,
        Json(Success::new(engine::CODE_CREATED, view(product))),
    ))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ProductList>,
) -> Result<Json<Success<ProductListResponse>>, ServerError> {
    let products = state.service.engine().products();
    let page = products
        .list(page_limit(params.limit), params.offset.unwrap_or(0))
        .await?;
    let total = products.count().await?;

    Ok(Json(Success::new(
        engine::CODE_SUCCESS,
        ProductListResponse {
            products: page.into_iter().map(view).collect(),
            total,
        },
    )))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<Success<ProductView>>, ServerError> {
    let product = state.service.engine().products().get_by_id(id).await?;

    Ok(Json(Success::new(engine::CODE_SUCCESS, view(product))))
}
