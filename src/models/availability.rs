// src/models/availability.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::reservations::ReservationType;

// --- Granularidade da consulta ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityGranularity {
    // dateFrom/dateTo são instantes RFC 3339.
    ExactInstant,
    // dateFrom/dateTo são datas de calendário (AAAA-MM-DD) no fuso do
    // restaurante.
    DateOnly,
}

// --- Intervalo consultado ---
// A granularidade faz parte do intervalo: consultas por dia usam datas de
// calendário (no fuso do restaurante) e ganham um TTL de cache bem maior,
// porque a hora exata não entra na chave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityRange {
    Exact {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    DateOnly {
        from: NaiveDate,
        to: NaiveDate,
    },
}

impl AvailabilityRange {
    // Chave determinística do snapshot: (intervalo, canal, granularidade).
    pub fn cache_key(&self, channel: ReservationType) -> String {
        match self {
            AvailabilityRange::Exact { from, to } => format!(
                "availability:{}:exact:{}:{}",
                channel.as_str(),
                from.timestamp(),
                to.timestamp()
            ),
            AvailabilityRange::DateOnly { from, to } => {
                format!("availability:{}:date:{}:{}", channel.as_str(), from, to)
            }
        }
    }
}

// --- Projeção agregada por ocorrência (linha vinda do ledger) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAvailability {
    pub concrete_period_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    // Soma das capacidades de TODAS as mesas com linha elegível no período.
    #[schema(example = 24)]
    pub total_capacity: i64,
    // Soma das capacidades só das linhas ainda com can_booked = true.
    #[schema(example = 18)]
    pub available_capacity: i64,
}

// --- Balde por dia de calendário ---
// Dias sem nenhuma ocorrência materializada são omitidos, nunca emitidos
// com capacidade zero.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatePeriodAvailability {
    pub date: NaiveDate,
    #[schema(example = 24)]
    pub total_capacity: i64,
    #[schema(example = 18)]
    pub available_capacity: i64,
    pub periods: Vec<PeriodAvailability>,
}
