use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante carrega também um `code` estável para o front-end
// decidir a política de retry sem fazer parse de mensagem.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Funcionário não encontrado")]
    EmployeeNotFound,

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Callback não encontrado")]
    CallbackNotFound,

    #[error("Transferência não encontrada")]
    TransferNotFound,

    // Operação tentada a partir de um estado que não a permite.
    // O chamador precisa reler o estado atual antes de decidir o próximo passo.
    #[error("Transição de estado inválida: {0}")]
    InvalidState(String),

    // Invariante violada na hora da escrita (transfer duplicado, corrida de status).
    // Seguro tentar de novo DEPOIS de reler o estado.
    #[error("Conflito: {0}")]
    Conflict(String),

    // O ator não tem legitimidade para a ação (ex: resolver transfer de outro).
    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "code": "VALIDATION",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "CONFLICT",
                "Este e-mail já está em uso.".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "E-mail ou senha inválidos.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            AppError::EmployeeNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Funcionário não encontrado.".to_string(),
            ),
            AppError::LeadNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Lead não encontrado.".to_string(),
            ),
            AppError::CallbackNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Callback não encontrado.".to_string(),
            ),
            AppError::TransferNotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Transferência não encontrada.".to_string(),
            ),

            AppError::InvalidState(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_STATE", msg)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros que só têm uma mensagem.
        let body = Json(json!({ "error": error_message, "code": code }));
        (status, body).into_response()
    }
}
