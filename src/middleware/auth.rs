// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{auth::Employee, reservations::ReservationType},
};

fn bearer_token(request: &axum::http::Request<axum::body::Body>) -> Option<&str> {
    request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

// Guardião estrito: rotas de funcionário exigem um token válido.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).ok_or(AppError::InvalidToken)?;
    let employee = app_state.auth_service.validate_token(token).await?;

    // Insere o funcionário nos "extensions" da requisição
    request.extensions_mut().insert(employee);
    Ok(next.run(request).await)
}

// Variante das rotas públicas de reserva: token válido identifica o
// funcionário (canal telefone/walk-in); sem token ou token inválido, a
// requisição segue como cliente online. Nunca rejeita.
pub async fn optional_auth_middleware(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(&request) {
        if let Ok(employee) = app_state.auth_service.validate_token(token).await {
            request.extensions_mut().insert(employee);
        }
    }
    next.run(request).await
}

// Extrator para obter o funcionário autenticado diretamente nos handlers
pub struct AuthenticatedEmployee(pub Employee);

impl<S> FromRequestParts<S> for AuthenticatedEmployee
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Employee>()
            .cloned()
            .map(AuthenticatedEmployee)
            .ok_or(AppError::InvalidToken)
    }
}

// Versão opcional, para as rotas que atendem cliente e funcionário.
pub struct MaybeEmployee(pub Option<Employee>);

impl<S> FromRequestParts<S> for MaybeEmployee
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeEmployee(parts.extensions.get::<Employee>().cloned()))
    }
}

// A camada de sessão decide o canal e o motor confia: cliente anônimo é
// sempre ONLINE_BOOKING, e o que ele mandar no payload é ignorado;
// funcionário escolhe o canal (padrão walk-in).
pub fn resolve_channel(
    employee: &Option<Employee>,
    requested: Option<ReservationType>,
) -> ReservationType {
    match employee {
        Some(_) => requested.unwrap_or(ReservationType::WalkInSeating),
        None => ReservationType::OnlineBooking,
    }
}
