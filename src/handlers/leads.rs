// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::lead::{Lead, LeadFilter, LeadSource, LeadStatus, PriorityLevel},
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub client_name: String,

    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Silva Importados ME")]
    pub business_name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@silvaimportados.com")]
    pub email: String,

    #[validate(length(min = 7, max = 16, message = "invalid_phone"))]
    #[schema(example = "+5511999990000")]
    pub phone: String,

    pub alternate_phone: Option<String>,

    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub priority: Option<PriorityLevel>,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    #[schema(example = "2500.00")]
    pub expected_revenue: Option<Decimal>,

    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,

    // Omitido: o lead fica com quem criou
    pub assigned_to: Option<Uuid>,

    pub notes: Option<String>,
    #[schema(example = json!(["vip", "2024"]))]
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-04-01")]
    pub next_follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadPayload {
    pub client_name: Option<String>,
    pub business_name: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub source: Option<LeadSource>,
    pub priority: Option<PriorityLevel>,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    pub expected_revenue: Option<Decimal>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub next_follow_up_date: Option<NaiveDate>,
    pub lost_reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusPayload {
    pub status: LeadStatus,
    // Lead fechado (Won/Lost) só aceita escrita com este flag explícito
    #[serde(default)]
    pub reopen: bool,
    pub lost_reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReassignLeadPayload {
    pub assigned_to: Uuid,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    pub query: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadListResponse {
    pub data: Vec<Lead>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// =============================================================================
//  HANDLERS
// =============================================================================

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 201, description = "Lead criado", body = Lead),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Json(payload): Json<CreateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let lead = app_state
        .lead_service
        .create_lead(
            &app_state.db_pool,
            &actor,
            &payload.client_name,
            &payload.business_name,
            &payload.email,
            &payload.phone,
            payload.alternate_phone.as_deref(),
            payload.source,
            payload.status,
            payload.priority,
            payload.industry.as_deref(),
            payload.website_url.as_deref(),
            payload.expected_revenue,
            payload.address.as_deref(),
            payload.city.as_deref(),
            payload.state.as_deref(),
            payload.country.as_deref(),
            payload.zip_code.as_deref(),
            payload.assigned_to,
            payload.notes.as_deref(),
            payload.tags,
            payload.next_follow_up_date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(lead)))
}

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadFilter),
    responses(
        (status = 200, description = "Lista paginada de leads", body = LeadListResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, AppError> {
    let (data, total) = app_state
        .lead_service
        .list_leads(&app_state.db_pool, &actor, &filter)
        .await?;

    Ok((
        StatusCode::OK,
        Json(LeadListResponse {
            data,
            total,
            page: filter.page(),
            limit: filter.limit(),
        }),
    ))
}

// GET /api/leads/lookup?query=...
#[utoipa::path(
    get,
    path = "/api/leads/lookup",
    tag = "Leads",
    params(LookupQuery),
    responses(
        (status = 200, description = "Lead encontrado", body = Lead),
        (status = 404, description = "Nenhum lead corresponde à busca")
    ),
    security(("api_jwt" = []))
)]
pub async fn lookup_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Query(params): Query<LookupQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .lookup(&app_state.db_pool, &actor, params.query.trim())
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = Lead),
        (status = 404, description = "Lead não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .get_lead(&app_state.db_pool, &actor, id)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// PUT /api/leads/{id}
#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadPayload,
    responses(
        (status = 200, description = "Lead atualizado", body = Lead)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let lead = app_state
        .lead_service
        .update_details(
            &app_state.db_pool,
            &actor,
            id,
            payload.client_name,
            payload.business_name,
            payload.email,
            payload.phone,
            payload.alternate_phone,
            payload.source,
            payload.priority,
            payload.industry,
            payload.website_url,
            payload.expected_revenue,
            payload.address,
            payload.city,
            payload.state,
            payload.country,
            payload.zip_code,
            payload.notes,
            payload.tags,
            payload.next_follow_up_date,
            payload.lost_reason,
        )
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/status
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/status",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = UpdateLeadStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Lead),
        (status = 422, description = "Lead fechado sem reopen explícito"),
        (status = 409, description = "Corrida de status detectada na escrita")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lead_status(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .update_status(
            &app_state.db_pool,
            &actor,
            id,
            payload.status,
            payload.reopen,
            payload.lost_reason.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/assignee
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/assignee",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    request_body = ReassignLeadPayload,
    responses(
        (status = 200, description = "Lead reatribuído", body = Lead),
        (status = 422, description = "Lead fechado tem o dono congelado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reassign_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReassignLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    let lead = app_state
        .lead_service
        .reassign(&app_state.db_pool, &actor, id, payload.assigned_to)
        .await?;

    Ok((StatusCode::OK, Json(lead)))
}

// DELETE /api/leads/{id}
#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 204, description = "Lead excluído"),
        (status = 409, description = "Callbacks/transferências em aberto bloqueiam a exclusão")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lead(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .lead_service
        .delete_lead(&app_state.db_pool, &actor, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
