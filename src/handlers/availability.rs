// src/handlers/availability.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{resolve_channel, MaybeEmployee},
    models::{
        availability::{AvailabilityGranularity, AvailabilityRange, DatePeriodAvailability},
        reservations::ReservationType,
    },
};

// ---
// Query: GetAvailability
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub granularity: AvailabilityGranularity,

    // RFC 3339 para exact-instant; AAAA-MM-DD para date-only.
    pub date_from: String,
    pub date_to: String,

    // Só considerado para funcionários; cliente anônimo consulta o canal
    // online, sempre.
    pub channel: Option<ReservationType>,
}

impl AvailabilityQuery {
    fn range(&self) -> Result<AvailabilityRange, AppError> {
        match self.granularity {
            AvailabilityGranularity::ExactInstant => {
                let from = parse_instant(&self.date_from)?;
                let to = parse_instant(&self.date_to)?;
                Ok(AvailabilityRange::Exact { from, to })
            }
            AvailabilityGranularity::DateOnly => {
                let from = parse_date(&self.date_from)?;
                let to = parse_date(&self.date_to)?;
                Ok(AvailabilityRange::DateOnly { from, to })
            }
        }
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidDateRange(format!("'{}' não é um instante RFC 3339", raw)))
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDateRange(format!("'{}' não é uma data AAAA-MM-DD", raw)))
}

// GET /api/availability
#[utoipa::path(
    get,
    path = "/api/availability",
    tag = "Availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Capacidade por dia/período, ascendente; vazio se nada materializado", body = Vec<DatePeriodAvailability>),
        (status = 400, description = "Intervalo de datas inválido")
    )
)]
pub async fn get_availability(
    State(app_state): State<AppState>,
    MaybeEmployee(employee): MaybeEmployee,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let channel = resolve_channel(&employee, query.channel);
    let range = query.range()?;

    let days = app_state
        .availability_service
        .get_availability(channel, range)
        .await?;

    Ok((StatusCode::OK, Json(days)))
}
