// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::auth::{Claims, Employee},
};

#[derive(Clone)]
pub struct AuthService {
    employee_repo: EmployeeRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(employee_repo: EmployeeRepository, jwt_secret: String) -> Self {
        Self {
            employee_repo,
            jwt_secret,
        }
    }

    pub async fn register_employee(
        &self,
        name: &str,
        email: &str,
        password: &str,
        position: Option<&str>,
        department: Option<&str>,
    ) -> Result<String, AppError> {
        // Hashing em thread separada para não travar o runtime
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let employee = self
            .employee_repo
            .create_employee(name, email, &hashed_password, position, department)
            .await?;

        self.create_token(employee.id)
    }

    pub async fn login_employee(&self, email: &str, password: &str) -> Result<String, AppError> {
        let employee = self
            .employee_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = employee.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(employee.id)
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        self.employee_repo.list().await
    }

    pub async fn validate_token(&self, token: &str) -> Result<Employee, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.employee_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::EmployeeNotFound)
    }

    fn create_token(&self, employee_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: employee_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
