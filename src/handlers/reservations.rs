// src/handlers/reservations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{resolve_channel, MaybeEmployee},
    models::reservations::{AllocationResult, ReservationDetail, ReservationLog, ReservationType},
};

// ---
// Payload: CreateReservation
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationPayload {
    #[validate(range(min = 1, max = 20, message = "O tamanho do grupo deve estar entre 1 e 20."))]
    #[schema(example = 4)]
    pub party_size: i32,

    pub concrete_period_id: Uuid,

    // Só considerado quando quem chama é um funcionário; cliente anônimo é
    // sempre canal online, independente do que mandar aqui.
    pub reservation_type: Option<ReservationType>,

    // Payload livre: contato, observações, restrições alimentares...
    #[serde(default)]
    pub options: serde_json::Value,
}

// POST /api/reservations
#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "Reservations",
    request_body = CreateReservationPayload,
    responses(
        (status = 201, description = "Mesa(s) alocada(s) e reserva criada", body = AllocationResult),
        (status = 404, description = "Período não encontrado"),
        (status = 409, description = "Sem mesa adequada, ou outra reserva levou a mesa primeiro"),
        (status = 422, description = "Tamanho de grupo fora dos formatos atendidos")
    )
)]
pub async fn create_reservation(
    State(app_state): State<AppState>,
    MaybeEmployee(employee): MaybeEmployee,
    Json(payload): Json<CreateReservationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let channel = resolve_channel(&employee, payload.reservation_type);

    let result = app_state
        .allocation_service
        .allocate(
            payload.party_size,
            channel,
            payload.concrete_period_id,
            payload.options,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

// ---
// Query: listagem
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListReservationsQuery {
    // Quantas reservas recentes devolver (padrão 50).
    pub limit: Option<i64>,
}

// GET /api/reservations
#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "Reservations",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Reservas mais recentes primeiro", body = Vec<ReservationLog>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reservations(
    State(app_state): State<AppState>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let reservations = app_state.reservation_service.list_recent(limit).await?;
    Ok((StatusCode::OK, Json(reservations)))
}

// GET /api/reservations/{id}
#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    tag = "Reservations",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva com as mesas reivindicadas", body = ReservationDetail),
        (status = 404, description = "Reserva não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_reservation(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.reservation_service.get_detail(id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/reservations/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    tag = "Reservations",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva cancelada, mesas liberadas", body = ReservationLog),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Reserva já cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_reservation(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let cancelled = app_state.allocation_service.cancel(id).await?;
    Ok((StatusCode::OK, Json(cancelled)))
}

// POST /api/reservations/{id}/seated
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/seated",
    tag = "Reservations",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Chegada registrada", body = ReservationLog),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Reserva cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_seated(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state.reservation_service.mark_seated(id).await?;
    Ok((StatusCode::OK, Json(reservation)))
}

// POST /api/reservations/{id}/departed
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/departed",
    tag = "Reservations",
    params(("id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Saída registrada", body = ReservationLog),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Reserva cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_departed(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reservation = app_state.reservation_service.mark_departed(id).await?;
    Ok((StatusCode::OK, Json(reservation)))
}
