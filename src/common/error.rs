use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// As variantes de alocação formam a taxonomia que o chamador enxerga:
// só `ConcurrentConflict` vale a pena re-tentar.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Período não encontrado")]
    PeriodNotFound,

    #[error("Tamanho de grupo não suportado: {0}")]
    UnsupportedPartySize(i32),

    #[error("Nenhuma mesa adequada disponível")]
    NoSuitableSeat,

    #[error("Outra reserva levou a mesa primeiro")]
    ConcurrentConflict,

    #[error("Mesa não encontrada")]
    SeatNotFound,

    #[error("Mesa já existe")]
    SeatAlreadyExists,

    #[error("Linha do ledger não encontrada")]
    SeatPeriodNotFound,

    #[error("Reserva não encontrada")]
    ReservationNotFound,

    #[error("Reserva já cancelada")]
    ReservationAlreadyCancelled,

    #[error("Intervalo de datas inválido: {0}")]
    InvalidDateRange(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados (fatal, nunca re-tentada
    // automaticamente pelo motor)
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
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // --- Taxonomia de alocação ---
            AppError::PeriodNotFound => (StatusCode::NOT_FOUND, "Período não encontrado.".to_string()),
            AppError::UnsupportedPartySize(n) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Não atendemos grupos de {} pessoas. Aceitamos de 1 a 4 e de 7 a 10.", n),
            ),
            AppError::NoSuitableSeat => (
                StatusCode::CONFLICT,
                "Nenhuma mesa adequada disponível para este período.".to_string(),
            ),
            AppError::ConcurrentConflict => (
                StatusCode::CONFLICT,
                "Outra reserva levou a mesa primeiro. Tente novamente.".to_string(),
            ),

            // --- CRUD / estado ---
            AppError::SeatNotFound => (StatusCode::NOT_FOUND, "Mesa não encontrada.".to_string()),
            AppError::SeatAlreadyExists => (StatusCode::CONFLICT, "Já existe uma mesa com esse prefixo e número.".to_string()),
            AppError::SeatPeriodNotFound => (StatusCode::NOT_FOUND, "Linha do ledger não encontrada.".to_string()),
            AppError::ReservationNotFound => (StatusCode::NOT_FOUND, "Reserva não encontrada.".to_string()),
            AppError::ReservationAlreadyCancelled => (StatusCode::CONFLICT, "Esta reserva já foi cancelada.".to_string()),
            AppError::InvalidDateRange(reason) => (
                StatusCode::BAD_REQUEST,
                format!("Intervalo de datas inválido: {}", reason),
            ),

            // --- Autenticação ---
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token de autenticação inválido ou ausente.".to_string()),

            // Todos os outros erros (DatabaseError, InternalServerError...) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.".to_string())
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
