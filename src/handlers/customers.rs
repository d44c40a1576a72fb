use super::common::PaginationParams;
use crate::{
    entities::{customer, special_price},
    errors::ServiceError,
    services::master_data::{CreateCustomerInput, SpecialPriceInput, UpdateCustomerInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CustomerSearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSpecialPriceRequest {
    pub special_price: Decimal,
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<customer::Model>> {
    let (page, per_page) = params.resolve(&state.config);
    let result = state
        .services
        .master_data
        .list_customers(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerInput>,
) -> Result<(StatusCode, Json<ApiResponse<customer::Model>>), ServiceError> {
    let created = state.services.master_data.create_customer(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<customer::Model> {
    let found = state.services.master_data.get_customer(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCustomerInput>,
) -> ApiResult<customer::Model> {
    let updated = state
        .services
        .master_data
        .update_customer(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.master_data.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ranked search: name, then care of, address, telephone
pub async fn search_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerSearchParams>,
) -> ApiResult<Vec<customer::Model>> {
    let found = state
        .services
        .master_data
        .search_customers(&params.q)
        .await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn list_special_prices(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> ApiResult<Vec<special_price::Model>> {
    let prices = state
        .services
        .master_data
        .list_special_prices(customer_id)
        .await?;
    Ok(Json(ApiResponse::success(prices)))
}

pub async fn create_special_price(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
    Json(payload): Json<SpecialPriceInput>,
) -> Result<(StatusCode, Json<ApiResponse<special_price::Model>>), ServiceError> {
    let created = state
        .services
        .master_data
        .set_special_price(customer_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn update_special_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSpecialPriceRequest>,
) -> ApiResult<special_price::Model> {
    let updated = state
        .services
        .master_data
        .update_special_price(id, payload.special_price)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_special_price(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.master_data.delete_special_price(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Product base names a special price can be keyed on
pub async fn special_price_base_names(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let names = state.services.master_data.available_base_names().await?;
    Ok(Json(ApiResponse::success(names)))
}
