// src/handlers/metrics.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::metrics::{CallbackWorkload, LeadFunnel, TransferVolume},
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    // Tamanho do ranking de transferências (padrão 5)
    pub top_n: Option<usize>,
}

// GET /api/metrics/pipeline
#[utoipa::path(
    get,
    path = "/api/metrics/pipeline",
    tag = "Metrics",
    responses(
        (status = 200, description = "Funil de leads: conversão, win rate, receita", body = LeadFunnel)
    ),
    security(("api_jwt" = []))
)]
pub async fn pipeline_funnel(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let funnel = app_state
        .metrics_service
        .pipeline_funnel(&app_state.db_pool, &actor)
        .await?;

    Ok((StatusCode::OK, Json(funnel)))
}

// GET /api/metrics/callbacks
#[utoipa::path(
    get,
    path = "/api/metrics/callbacks",
    tag = "Metrics",
    responses(
        (status = 200, description = "Carga de callbacks por balde de tempo", body = CallbackWorkload)
    ),
    security(("api_jwt" = []))
)]
pub async fn callback_workload(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    // O relógio entra aqui, na borda; o agregador é função pura de (dados, hoje)
    let today = Utc::now().date_naive();

    let workload = app_state
        .metrics_service
        .callback_workload(&app_state.db_pool, &actor, today)
        .await?;

    Ok((StatusCode::OK, Json(workload)))
}

// GET /api/metrics/transfers
#[utoipa::path(
    get,
    path = "/api/metrics/transfers",
    tag = "Metrics",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Volume de transferências e ranking por funcionário", body = TransferVolume)
    ),
    security(("api_jwt" = []))
)]
pub async fn transfer_volume(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(actor): AuthenticatedEmployee,
    Query(params): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let volume = app_state
        .metrics_service
        .transfer_volume(&app_state.db_pool, &actor, params.top_n.unwrap_or(5))
        .await?;

    Ok((StatusCode::OK, Json(volume)))
}
