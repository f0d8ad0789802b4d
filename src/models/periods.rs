// src/models/periods.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "period_interval_unit", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodIntervalUnit {
    Day,
    Week,
    Month,
}

// --- Modelo de período (recorrência) ---
// Somente leitura depois de criado: define como as ocorrências concretas
// são materializadas (âncora + cadência).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: Uuid,
    #[schema(example = "Jantar de sábado")]
    pub title: String,
    pub interval_unit: PeriodIntervalUnit,
    #[schema(example = 1)]
    pub interval_amount: i32,
    pub anchor_start: DateTime<Utc>,
    // Valor padrão de `can_online_booked` nas linhas do ledger geradas.
    pub online_default: bool,
    pub created_at: DateTime<Utc>,
}

// --- Ocorrência concreta ---
// `ended_at` é derivado: início + duração fixa da sessão. Ocorrências
// históricas são mantidas para auditoria, nunca apagadas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConcretePeriod {
    pub id: Uuid,
    pub period_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// --- Relatório da materialização ---
// Rodar de novo sobre uma janela já materializada devolve tudo zerado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterializationReport {
    #[schema(example = 12)]
    pub created_periods: u64,
    #[schema(example = 96)]
    pub created_seat_periods: u64,
}
