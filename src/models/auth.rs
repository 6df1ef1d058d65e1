// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papel do funcionário no sistema. O resto (cargo/departamento) é texto livre
// vindo do diretório, o core só consulta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmployeeRole {
    SuperAdmin,
    Employee,
}

// Representa um funcionário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub position: Option<String>,
    pub department: Option<String>,
    pub role: EmployeeRole,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_super_admin(&self) -> bool {
        self.role == EmployeeRole::SuperAdmin
    }

    // Gestão de pipeline é restrita ao super-admin e ao time de vendas
    pub fn can_manage_pipeline(&self) -> bool {
        self.is_super_admin()
            || self
                .department
                .as_deref()
                .is_some_and(|d| d == "marketingAndSales")
    }

    // Só cargos de supervisão podem receber transferências de callback
    pub fn has_supervisory_position(&self) -> bool {
        const VALID_POSITIONS: [&str; 3] = ["supervisor", "team lead", "manager"];
        self.position
            .as_deref()
            .is_some_and(|p| {
                let p = p.to_lowercase();
                VALID_POSITIONS.iter().any(|valid| p.contains(valid))
            })
    }
}

// Dados para registro de um novo funcionário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEmployeePayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[schema(example = "Team Lead")]
    pub position: Option<String>,
    #[schema(example = "marketingAndSales")]
    pub department: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginEmployeePayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do funcionário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
