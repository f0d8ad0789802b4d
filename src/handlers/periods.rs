// src/handlers/periods.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::periods::{ConcretePeriod, MaterializationReport, Period, PeriodIntervalUnit},
};

// ---
// Payload: CreatePeriod (modelo de recorrência)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodPayload {
    #[validate(length(min = 1, message = "O título é obrigatório."))]
    #[schema(example = "Jantar de sábado")]
    pub title: String,

    #[schema(example = "WEEK")]
    pub interval_unit: PeriodIntervalUnit,

    #[validate(range(min = 1, message = "A cadência deve ser de pelo menos 1."))]
    #[schema(example = 1)]
    pub interval_amount: i32,

    pub anchor_start: DateTime<Utc>,

    // Valor padrão do flag de canal online nas linhas geradas.
    #[serde(default = "default_online")]
    #[schema(example = true)]
    pub online_default: bool,
}

fn default_online() -> bool {
    true
}

// POST /api/periods
#[utoipa::path(
    post,
    path = "/api/periods",
    tag = "Periods",
    request_body = CreatePeriodPayload,
    responses(
        (status = 201, description = "Modelo de período criado", body = Period)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_period(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePeriodPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let period = app_state
        .period_service
        .create_template(
            &payload.title,
            payload.interval_unit,
            payload.interval_amount,
            payload.anchor_start,
            payload.online_default,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(period)))
}

// GET /api/periods
#[utoipa::path(
    get,
    path = "/api/periods",
    tag = "Periods",
    responses(
        (status = 200, description = "Modelos de período", body = Vec<Period>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_periods(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let periods = app_state.period_service.list_templates().await?;
    Ok((StatusCode::OK, Json(periods)))
}

// GET /api/periods/{id}/occurrences
#[utoipa::path(
    get,
    path = "/api/periods/{id}/occurrences",
    tag = "Periods",
    params(("id" = Uuid, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Ocorrências já materializadas", body = Vec<ConcretePeriod>),
        (status = 404, description = "Modelo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_concrete_periods(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let periods = app_state.period_service.list_concrete_periods(id).await?;
    Ok((StatusCode::OK, Json(periods)))
}

// ---
// Payload: Materialize
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterializePayload {
    // Até quando expandir a recorrência (inclusivo).
    pub horizon_end: DateTime<Utc>,
}

// POST /api/periods/{id}/materialize
#[utoipa::path(
    post,
    path = "/api/periods/{id}/materialize",
    tag = "Periods",
    request_body = MaterializePayload,
    params(("id" = Uuid, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Janela materializada (idempotente)", body = MaterializationReport),
        (status = 404, description = "Modelo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn materialize_periods(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MaterializePayload>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state
        .period_service
        .materialize_periods(id, payload.horizon_end)
        .await?;

    Ok((StatusCode::OK, Json(report)))
}
