use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use kasira_application::{Actor, NewProductInput};
use kasira_domain::ProductId;

use crate::auth::extract_request_context;
use crate::dto::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_product_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    headers: HeaderMap,
    Json(payload): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .product_service
        .create_product(
            &actor,
            NewProductInput {
                name: payload.name,
                sku: payload.sku,
                price: payload.price,
            },
            extract_request_context(&headers),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

pub async fn get_product_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<i64>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .product_service
        .find_product(&actor, ProductId::new(product_id))
        .await?;

    Ok(Json(ProductResponse::from(&product)))
}

pub async fn update_product_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .product_service
        .update_product_details(
            &actor,
            ProductId::new(product_id),
            &payload.name,
            &payload.sku,
            extract_request_context(&headers),
        )
        .await?;

    Ok(Json(ProductResponse::from(&product)))
}
