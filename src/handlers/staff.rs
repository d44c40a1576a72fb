use crate::{
    entities::{deliveryman, salesman},
    errors::ServiceError,
    services::master_data::{StaffInput, StaffPatch},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_salesmen(State(state): State<AppState>) -> ApiResult<Vec<salesman::Model>> {
    let salesmen = state.services.master_data.list_salesmen().await?;
    Ok(Json(ApiResponse::success(salesmen)))
}

pub async fn create_salesman(
    State(state): State<AppState>,
    Json(payload): Json<StaffInput>,
) -> Result<(StatusCode, Json<ApiResponse<salesman::Model>>), ServiceError> {
    let created = state.services.master_data.create_salesman(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_salesman(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<salesman::Model> {
    let found = state.services.master_data.get_salesman(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_salesman(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StaffPatch>,
) -> ApiResult<salesman::Model> {
    let updated = state
        .services
        .master_data
        .update_salesman(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn list_deliverymen(
    State(state): State<AppState>,
) -> ApiResult<Vec<deliveryman::Model>> {
    let deliverymen = state.services.master_data.list_deliverymen().await?;
    Ok(Json(ApiResponse::success(deliverymen)))
}

pub async fn create_deliveryman(
    State(state): State<AppState>,
    Json(payload): Json<StaffInput>,
) -> Result<(StatusCode, Json<ApiResponse<deliveryman::Model>>), ServiceError> {
    let created = state
        .services
        .master_data
        .create_deliveryman(payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

pub async fn get_deliveryman(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<deliveryman::Model> {
    let found = state.services.master_data.get_deliveryman(id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_deliveryman(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<StaffPatch>,
) -> ApiResult<deliveryman::Model> {
    let updated = state
        .services
        .master_data
        .update_deliveryman(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
