// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::auth::{AuthResponse, Employee, LoginEmployeePayload, RegisterEmployeePayload},
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterEmployeePayload,
    responses(
        (status = 200, description = "Funcionário registrado, token emitido", body = AuthResponse),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterEmployeePayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let token = app_state
        .auth_service
        .register_employee(
            &payload.name,
            &payload.email,
            &payload.password,
            payload.position.as_deref(),
            payload.department.as_deref(),
        )
        .await?;

    Ok(Json(AuthResponse { token }))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginEmployeePayload,
    responses(
        (status = 200, description = "Login efetuado, token emitido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginEmployeePayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let token = app_state
        .auth_service
        .login_employee(&payload.email, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Funcionário autenticado", body = Employee)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedEmployee(employee): AuthenticatedEmployee) -> Json<Employee> {
    Json(employee)
}

// GET /api/employees — diretório para escolher destinos de atribuição/handoff
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Auth",
    responses(
        (status = 200, description = "Diretório de funcionários", body = Vec<Employee>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(_actor): AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let employees = app_state.auth_service.list_employees().await?;

    Ok((StatusCode::OK, Json(employees)))
}
