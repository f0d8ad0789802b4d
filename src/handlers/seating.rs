// src/handlers/seating.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::seating::{Seat, SeatPeriod},
};

// ---
// Validação Customizada
// ---
// Os formatos físicos de mesa do salão: 2, 4 ou 10 lugares.
fn validate_capacity(capacity: i32) -> Result<(), ValidationError> {
    if !matches!(capacity, 2 | 4 | 10) {
        let mut err = ValidationError::new("capacity");
        err.message = Some("A capacidade deve ser 2, 4 ou 10 lugares.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateSeat
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeatPayload {
    #[validate(length(min = 1, max = 2, message = "O prefixo da zona é obrigatório (ex.: 'A')."))]
    #[schema(example = "A")]
    pub prefix: String,

    #[validate(range(min = 1, message = "O número da mesa deve ser positivo."))]
    #[schema(example = 2)]
    pub no: i32,

    #[validate(custom(function = "validate_capacity"))]
    #[schema(example = 2)]
    pub capacity: i32,
}

// POST /api/seats
#[utoipa::path(
    post,
    path = "/api/seats",
    tag = "Seating",
    request_body = CreateSeatPayload,
    responses(
        (status = 201, description = "Mesa criada", body = Seat),
        (status = 409, description = "Já existe mesa com esse prefixo e número")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_seat(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateSeatPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let seat = app_state
        .seating_service
        .create_seat(&payload.prefix, payload.no, payload.capacity)
        .await?;

    Ok((StatusCode::CREATED, Json(seat)))
}

// GET /api/seats
#[utoipa::path(
    get,
    path = "/api/seats",
    tag = "Seating",
    responses(
        (status = 200, description = "Todas as mesas, em ordem de zona/número", body = Vec<Seat>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_seats(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let seats = app_state.seating_service.list_seats().await?;
    Ok((StatusCode::OK, Json(seats)))
}

// ---
// Payload: LinkSibling
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkSiblingPayload {
    pub sibling_seat_id: Uuid,

    // Grava também a ligação de volta (o caso comum no salão).
    #[serde(default)]
    #[schema(example = true)]
    pub bidirectional: bool,
}

// POST /api/seats/{id}/siblings
#[utoipa::path(
    post,
    path = "/api/seats/{id}/siblings",
    tag = "Seating",
    request_body = LinkSiblingPayload,
    params(("id" = Uuid, Path, description = "ID da mesa")),
    responses(
        (status = 204, description = "Ligação declarada"),
        (status = 404, description = "Mesa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_sibling(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkSiblingPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .seating_service
        .link_sibling(id, payload.sibling_seat_id, payload.bidirectional)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/seats/{id}/siblings
#[utoipa::path(
    get,
    path = "/api/seats/{id}/siblings",
    tag = "Seating",
    params(("id" = Uuid, Path, description = "ID da mesa")),
    responses(
        (status = 200, description = "Mesas combináveis com esta", body = Vec<Seat>),
        (status = 404, description = "Mesa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_siblings(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let siblings = app_state.seating_service.list_siblings(id).await?;
    Ok((StatusCode::OK, Json(siblings)))
}

// ---
// Payload: UpdateSeatPeriod (bloqueio/desbloqueio de operador)
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeatPeriodPayload {
    pub can_booked: Option<bool>,
    pub can_online_booked: Option<bool>,
}

// PATCH /api/seat-periods/{id}
#[utoipa::path(
    patch,
    path = "/api/seat-periods/{id}",
    tag = "Seating",
    request_body = UpdateSeatPeriodPayload,
    params(("id" = Uuid, Path, description = "ID da linha do ledger")),
    responses(
        (status = 200, description = "Linha atualizada", body = SeatPeriod),
        (status = 404, description = "Linha não encontrada"),
        (status = 409, description = "Linha reivindicada por uma reserva ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_seat_period(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSeatPeriodPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state
        .seating_service
        .update_seat_period(id, payload.can_booked, payload.can_online_booked)
        .await?;

    Ok((StatusCode::OK, Json(updated)))
}

// GET /api/periods/occurrences/{id}/seat-periods
#[utoipa::path(
    get,
    path = "/api/periods/occurrences/{id}/seat-periods",
    tag = "Seating",
    params(("id" = Uuid, Path, description = "ID da ocorrência concreta")),
    responses(
        (status = 200, description = "Ledger da ocorrência, mesa a mesa", body = Vec<SeatPeriod>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_seat_periods(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.seating_service.list_seat_periods(id).await?;
    Ok((StatusCode::OK, Json(rows)))
}
