use super::common::MonthPath;
use crate::{
    services::reports::{
        DeliverymanReport, PaymentReport, ProductAnalysis, SalesmanCommission,
        SalesmanMonthlyReport, SalesmanMonths, UnpaidSummary,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StaffMonthPath {
    pub id: i32,
    pub year: i32,
    pub month: u32,
}

pub async fn salesman_months(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<SalesmanMonths> {
    let months = state.services.reports.salesman_monthly_preview(id).await?;
    Ok(Json(ApiResponse::success(months)))
}

pub async fn salesman_report(
    State(state): State<AppState>,
    Path(path): Path<StaffMonthPath>,
) -> ApiResult<SalesmanMonthlyReport> {
    let report = state
        .services
        .reports
        .salesman_monthly_report(path.id, path.year, path.month)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn commissions(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> ApiResult<Vec<SalesmanCommission>> {
    let commissions = state
        .services
        .reports
        .all_salesmen_commissions(path.year, path.month)
        .await?;
    Ok(Json(ApiResponse::success(commissions)))
}

pub async fn product_analysis(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> ApiResult<ProductAnalysis> {
    let analysis = state
        .services
        .reports
        .monthly_product_analysis(path.year, path.month)
        .await?;
    Ok(Json(ApiResponse::success(analysis)))
}

pub async fn unpaid(State(state): State<AppState>) -> ApiResult<UnpaidSummary> {
    let summary = state.services.reports.unpaid_summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn payments(
    State(state): State<AppState>,
    Path(path): Path<MonthPath>,
) -> ApiResult<PaymentReport> {
    let report = state
        .services
        .reports
        .monthly_payment_report(path.year, path.month)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn deliveryman_report(
    State(state): State<AppState>,
    Path(path): Path<StaffMonthPath>,
) -> ApiResult<DeliverymanReport> {
    let report = state
        .services
        .reports
        .deliveryman_monthly_report(path.id, path.year, path.month)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
