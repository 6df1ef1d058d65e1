// src/handlers/transfers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::transfer::{Transfer, TransferDecision},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiateTransferPayload {
    pub transferred_to: Uuid,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveTransferPayload {
    #[schema(example = "Accept")]
    pub decision: TransferDecision,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTransferPayload {
    pub remarks: Option<String>,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/transfers/callback/{callbackId}
#[utoipa::path(
    post,
    path = "/api/transfers/callback/{callbackId}",
    tag = "Transfers",
    params(("callbackId" = Uuid, Path, description = "ID do callback a transferir")),
    request_body = InitiateTransferPayload,
    responses(
        (status = 201, description = "Transferência iniciada (posse ainda não muda)", body = Transfer),
        (status = 409, description = "Já existe uma transferência em aberto para o callback")
    ),
    security(("api_jwt" = []))
)]
pub async fn initiate_transfer(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(callback_id): Path<Uuid>,
    Json(payload): Json<InitiateTransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state
        .transfer_service
        .initiate_transfer(
            &app_state.db_pool,
            &actor,
            callback_id,
            payload.transferred_to,
            payload.remarks.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

// GET /api/transfers/my-transfers
#[utoipa::path(
    get,
    path = "/api/transfers/my-transfers",
    tag = "Transfers",
    responses(
        (status = 200, description = "Transferências recebidas pelo funcionário logado", body = Vec<Transfer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn my_transfers(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state
        .transfer_service
        .my_transfers(&app_state.db_pool, &actor)
        .await?;

    Ok((StatusCode::OK, Json(transfers)))
}

// GET /api/transfers/all
#[utoipa::path(
    get,
    path = "/api/transfers/all",
    tag = "Transfers",
    responses(
        (status = 200, description = "Todas as transferências (Super Admin)", body = Vec<Transfer>),
        (status = 403, description = "Exclusivo do Super Admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn all_transfers(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state
        .transfer_service
        .all_transfers(&app_state.db_pool, &actor)
        .await?;

    Ok((StatusCode::OK, Json(transfers)))
}

// GET /api/transfers/callback/{callbackId}
#[utoipa::path(
    get,
    path = "/api/transfers/callback/{callbackId}",
    tag = "Transfers",
    params(("callbackId" = Uuid, Path, description = "ID do callback")),
    responses(
        (status = 200, description = "Histórico de handoffs do callback", body = Vec<Transfer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn transfers_by_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(callback_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transfers = app_state
        .transfer_service
        .list_by_callback(&app_state.db_pool, &actor, callback_id)
        .await?;

    Ok((StatusCode::OK, Json(transfers)))
}

// PATCH /api/transfers/{id}/resolve
#[utoipa::path(
    patch,
    path = "/api/transfers/{id}/resolve",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    request_body = ResolveTransferPayload,
    responses(
        (status = 200, description = "Transferência aceita (posse muda) ou rejeitada (posse fica)", body = Transfer),
        (status = 403, description = "Só o destinatário resolve"),
        (status = 422, description = "Transferência já resolvida")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_transfer(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveTransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state
        .transfer_service
        .resolve_transfer(
            &app_state.db_pool,
            &actor,
            id,
            payload.decision,
            payload.remarks.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(transfer)))
}

// PATCH /api/transfers/{id}/complete
#[utoipa::path(
    patch,
    path = "/api/transfers/{id}/complete",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    request_body = CompleteTransferPayload,
    responses(
        (status = 200, description = "Transferência encerrada", body = Transfer),
        (status = 422, description = "Só transferência aceita pode encerrar")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_transfer(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteTransferPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transfer = app_state
        .transfer_service
        .complete_transfer(&app_state.db_pool, &actor, id, payload.remarks.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(transfer)))
}

// DELETE /api/transfers/{id}
#[utoipa::path(
    delete,
    path = "/api/transfers/{id}",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 204, description = "Transferência retirada pelo iniciador"),
        (status = 422, description = "Transferência já resolvida não pode ser retirada")
    ),
    security(("api_jwt" = []))
)]
pub async fn withdraw_transfer(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .transfer_service
        .withdraw_transfer(&app_state.db_pool, &actor, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
