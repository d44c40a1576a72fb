use crate::{
    entities::{additional_item, invoice},
    errors::ServiceError,
    services::{
        invoice_items::{InvoiceLinePatch, LineChangeOutcome, NewInvoiceLine},
        invoicing::{
            AdditionalItemInput, CreateInvoiceInput, InvoiceDetail, InvoiceFilter,
            UpdateInvoiceInput,
        },
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::PaginationParams;

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListQuery {
    pub number: Option<String>,
    pub customer_id: Option<i32>,
    pub salesman_id: Option<i32>,
    pub deliveryman_id: Option<i32>,
    pub delivered_from: Option<NaiveDate>,
    pub delivered_to: Option<NaiveDate>,
    #[serde(default)]
    pub unpaid_only: bool,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub number: String,
}

/// Body of `PATCH /invoices/delivery`
#[derive(Debug, Deserialize)]
pub struct DeliveryUpdateRequest {
    pub number: String,
    pub delivery_date: Option<NaiveDate>,
    pub deliveryman: Option<String>,
}

/// Body of `PATCH /invoices/payment`
#[derive(Debug, Deserialize)]
pub struct PaymentUpdateRequest {
    pub number: String,
    pub payment_date: Option<NaiveDate>,
    pub cheque_detail: Option<String>,
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<InvoiceListQuery>,
) -> ApiResult<PaginatedResponse<invoice::Model>> {
    let (page, per_page) = PaginationParams {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(&state.config);
    let filter = InvoiceFilter {
        number: query.number,
        customer_id: query.customer_id,
        salesman_id: query.salesman_id,
        deliveryman_id: query.deliveryman_id,
        delivered_from: query.delivered_from,
        delivered_to: query.delivered_to,
        unpaid_only: query.unpaid_only,
    };

    let result = state
        .services
        .invoices
        .list_invoices(filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceInput>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceDetail>>), ServiceError> {
    let detail = state.services.invoices.create_invoice(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

pub async fn next_number(State(state): State<AppState>) -> ApiResult<NextNumberResponse> {
    let number = state.services.invoices.generate_next_number().await?;
    Ok(Json(ApiResponse::success(NextNumberResponse { number })))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<InvoiceDetail> {
    let detail = state.services.invoices.get_invoice_detail(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInvoiceInput>,
) -> ApiResult<invoice::Model> {
    let updated = state.services.invoices.update_invoice(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.invoices.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a line; stock is deducted and the total recomputed
pub async fn add_line(
    State(state): State<AppState>,
    Path(invoice_id): Path<i32>,
    Json(payload): Json<NewInvoiceLine>,
) -> Result<(StatusCode, Json<ApiResponse<LineChangeOutcome>>), ServiceError> {
    let outcome = state
        .services
        .invoice_lines
        .create_line(invoice_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

pub async fn update_line(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Json(payload): Json<InvoiceLinePatch>,
) -> ApiResult<LineChangeOutcome> {
    let outcome = state
        .services
        .invoice_lines
        .update_line(item_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn delete_line(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> ApiResult<LineChangeOutcome> {
    let outcome = state.services.invoice_lines.delete_line(item_id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn add_additional_item(
    State(state): State<AppState>,
    Path(invoice_id): Path<i32>,
    Json(payload): Json<AdditionalItemInput>,
) -> Result<(StatusCode, Json<ApiResponse<additional_item::Model>>), ServiceError> {
    let item = state
        .services
        .invoices
        .add_additional_item(invoice_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

pub async fn remove_additional_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .invoices
        .remove_additional_item(item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Repeat an earlier order under the next free number
pub async fn copy_invoice(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceDetail>>), ServiceError> {
    let detail = state.services.invoices.copy_invoice(number).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(detail))))
}

pub async fn update_delivery(
    State(state): State<AppState>,
    Json(payload): Json<DeliveryUpdateRequest>,
) -> ApiResult<invoice::Model> {
    let updated = state
        .services
        .invoices
        .set_delivery_date(payload.number, payload.delivery_date, payload.deliveryman)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Json(payload): Json<PaymentUpdateRequest>,
) -> ApiResult<invoice::Model> {
    let updated = state
        .services
        .invoices
        .set_payment_date(payload.number, payload.payment_date, payload.cheque_detail)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
