// src/handlers/callbacks.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::callback::{CallbackChannel, CallbackFilter, CallbackStatus, CallbackView},
    models::lead::PriorityLevel,
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallbackPayload {
    pub lead_id: Uuid,

    #[schema(value_type = String, format = Date, example = "2024-03-20")]
    pub callback_date: NaiveDate,

    // Formato HH:MM, validado no serviço e no CHECK do banco
    #[validate(length(min = 4, max = 5, message = "invalid_time"))]
    #[schema(example = "14:30")]
    pub callback_time: String,

    pub callback_type: Option<CallbackChannel>,
    pub priority: Option<PriorityLevel>,

    // Omitido: admin devolve ao dono do lead, funcionário fica com o próprio
    pub assigned_to: Option<Uuid>,

    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReschedulePayload {
    #[schema(value_type = String, format = Date, example = "2024-03-22")]
    pub callback_date: NaiveDate,

    #[validate(length(min = 4, max = 5, message = "invalid_time"))]
    #[schema(example = "09:00")]
    pub callback_time: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCallbackPayload {
    pub outcome: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCallbackStatusPayload {
    pub status: CallbackStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCallbackPayload {
    pub callback_type: Option<CallbackChannel>,
    pub priority: Option<PriorityLevel>,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackListResponse {
    pub data: Vec<CallbackView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/callbacks
#[utoipa::path(
    post,
    path = "/api/callbacks",
    tag = "Callbacks",
    request_body = CreateCallbackPayload,
    responses(
        (status = 201, description = "Callback criado", body = crate::models::callback::Callback),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Json(payload): Json<CreateCallbackPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let callback = app_state
        .callback_service
        .create_callback(
            &app_state.db_pool,
            &actor,
            payload.lead_id,
            payload.callback_date,
            &payload.callback_time,
            payload.callback_type,
            payload.priority,
            payload.assigned_to,
            payload.remarks.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(callback)))
}

// GET /api/callbacks
#[utoipa::path(
    get,
    path = "/api/callbacks",
    tag = "Callbacks",
    params(CallbackFilter),
    responses(
        (status = 200, description = "Lista paginada de callbacks com balde de tempo", body = CallbackListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_callbacks(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Query(filter): Query<CallbackFilter>,
) -> Result<impl IntoResponse, AppError> {
    // "Hoje" é resolvido aqui, na borda; o classificador nunca lê relógio
    let today = Utc::now().date_naive();

    let (data, total) = app_state
        .callback_service
        .list_callbacks(&app_state.db_pool, &actor, &filter, today)
        .await?;

    Ok((
        StatusCode::OK,
        Json(CallbackListResponse {
            data,
            total,
            page: filter.page(),
            limit: filter.limit(),
        }),
    ))
}

// GET /api/callbacks/{id}
#[utoipa::path(
    get,
    path = "/api/callbacks/{id}",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    responses(
        (status = 200, description = "Callback com balde de tempo", body = CallbackView),
        (status = 404, description = "Callback não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();

    let callback = app_state
        .callback_service
        .get_callback(&app_state.db_pool, &actor, id, today)
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// PUT /api/callbacks/{id}
#[utoipa::path(
    put,
    path = "/api/callbacks/{id}",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    request_body = UpdateCallbackPayload,
    responses(
        (status = 200, description = "Callback atualizado", body = crate::models::callback::Callback)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCallbackPayload>,
) -> Result<impl IntoResponse, AppError> {
    let callback = app_state
        .callback_service
        .update_details(
            &app_state.db_pool,
            &actor,
            id,
            payload.callback_type,
            payload.priority,
            payload.remarks,
        )
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// PATCH /api/callbacks/{id}/reschedule
#[utoipa::path(
    patch,
    path = "/api/callbacks/{id}/reschedule",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    request_body = ReschedulePayload,
    responses(
        (status = 200, description = "Callback reagendado (contador incrementado)", body = crate::models::callback::Callback),
        (status = 422, description = "Callback concluído/cancelado não reagenda")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let callback = app_state
        .callback_service
        .reschedule(
            &app_state.db_pool,
            &actor,
            id,
            payload.callback_date,
            &payload.callback_time,
        )
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// PATCH /api/callbacks/{id}/complete
#[utoipa::path(
    patch,
    path = "/api/callbacks/{id}/complete",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    request_body = CompleteCallbackPayload,
    responses(
        (status = 200, description = "Callback concluído (idempotente)", body = crate::models::callback::Callback)
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteCallbackPayload>,
) -> Result<impl IntoResponse, AppError> {
    let callback = app_state
        .callback_service
        .complete(&app_state.db_pool, &actor, id, payload.outcome.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// PATCH /api/callbacks/{id}/cancel
#[utoipa::path(
    patch,
    path = "/api/callbacks/{id}/cancel",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    responses(
        (status = 200, description = "Callback cancelado", body = crate::models::callback::Callback),
        (status = 422, description = "Callback concluído não cancela")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let callback = app_state
        .callback_service
        .cancel(&app_state.db_pool, &actor, id)
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// PATCH /api/callbacks/{id}/status
#[utoipa::path(
    patch,
    path = "/api/callbacks/{id}/status",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    request_body = UpdateCallbackStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = crate::models::callback::Callback)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_callback_status(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCallbackStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let callback = app_state
        .callback_service
        .set_status(&app_state.db_pool, &actor, id, payload.status)
        .await?;

    Ok((StatusCode::OK, Json(callback)))
}

// DELETE /api/callbacks/{id}
#[utoipa::path(
    delete,
    path = "/api/callbacks/{id}",
    tag = "Callbacks",
    params(("id" = Uuid, Path, description = "ID do callback")),
    responses(
        (status = 204, description = "Callback excluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_callback(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .callback_service
        .delete_callback(&app_state.db_pool, &actor, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/callbacks/lead/{leadId}
#[utoipa::path(
    get,
    path = "/api/callbacks/lead/{leadId}",
    tag = "Callbacks",
    params(("leadId" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Histórico de callbacks do lead", body = Vec<CallbackView>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_callbacks_by_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(lead_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();

    let callbacks = app_state
        .callback_service
        .list_by_lead(&app_state.db_pool, &actor, lead_id, today)
        .await?;

    Ok((StatusCode::OK, Json(callbacks)))
}
