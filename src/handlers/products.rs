use super::common::PaginationParams;
use crate::{
    entities::{product, product_transaction::TransactionType},
    errors::ServiceError,
    services::inventory::{
        CreateProductInput, ProductFilter, StockMovement, TransactionFilter, UpdateProductInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub product_id: Option<i32>,
    pub transaction_type: Option<TransactionType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub include_memo: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl TransactionQuery {
    fn split(self) -> (TransactionFilter, PaginationParams) {
        (
            TransactionFilter {
                product_id: self.product_id,
                transaction_type: self.transaction_type,
                from: self.from,
                to: self.to,
                include_memo: self.include_memo,
            },
            PaginationParams {
                page: self.page,
                per_page: self.per_page,
            },
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CopyProductRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: Decimal,
    pub description: Option<String>,
}

/// List products, in-stock first
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<product::Model>> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let filter = ProductFilter {
        search: query.search,
        in_stock_only: query.in_stock_only,
    };

    let result = state
        .services
        .inventory
        .list_products(filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    let created = state.services.inventory.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<product::Model> {
    let found = state.services.inventory.get_product(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductInput>,
) -> ApiResult<product::Model> {
    let updated = state.services.inventory.update_product(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.inventory.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn copy_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Option<Json<CopyProductRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<product::Model>>), ServiceError> {
    let name = payload.and_then(|Json(body)| body.name);
    let copy = state.services.inventory.copy_product(id, name).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(copy))))
}

pub async fn restock_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<RestockRequest>,
) -> ApiResult<StockMovement> {
    let movement = state
        .services
        .inventory
        .restock(id, payload.quantity, payload.description)
        .await?;
    Ok(Json(ApiResponse::success(movement)))
}

/// Ledger entries of one product
pub async fn product_transactions(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<PaginatedResponse<crate::entities::product_transaction::Model>> {
    state.services.inventory.get_product(id).await?;
    let (mut filter, paging) = query.split();
    filter.product_id = Some(id);
    let (page, per_page) = paging.resolve(&state.config);

    let result = state
        .services
        .inventory
        .list_transactions(filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// Ledger entries across products
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<PaginatedResponse<crate::entities::product_transaction::Model>> {
    let (filter, paging) = query.split();
    let (page, per_page) = paging.resolve(&state.config);

    let result = state
        .services
        .inventory
        .list_transactions(filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}
