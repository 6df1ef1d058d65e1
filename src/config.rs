// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{CallbackRepository, EmployeeRepository, LeadRepository, TransferRepository},
    services::{
        auth::AuthService, callback_service::CallbackService, lead_service::LeadService,
        metrics_service::MetricsService, transfer_service::TransferService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub lead_service: LeadService,
    pub callback_service: CallbackService,
    pub transfer_service: TransferService,
    pub metrics_service: MetricsService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let callback_repo = CallbackRepository::new(db_pool.clone());
        let transfer_repo = TransferRepository::new(db_pool.clone());

        let auth_service = AuthService::new(employee_repo.clone(), jwt_secret);
        let lead_service = LeadService::new(lead_repo.clone(), employee_repo.clone());
        let callback_service = CallbackService::new(
            callback_repo.clone(),
            lead_repo.clone(),
            employee_repo.clone(),
        );
        let transfer_service = TransferService::new(
            transfer_repo.clone(),
            callback_repo.clone(),
            employee_repo,
        );
        let metrics_service = MetricsService::new(lead_repo, callback_repo, transfer_repo);

        Ok(Self {
            db_pool,
            auth_service,
            lead_service,
            callback_service,
            transfer_service,
            metrics_service,
        })
    }
}
