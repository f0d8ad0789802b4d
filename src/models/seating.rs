// src/models/seating.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Mesa (Seat) ---
// Identidade: prefixo da zona ("A", "B"...) + número. A capacidade vem dos
// formatos físicos de mesa do salão (2, 4 ou 10 lugares).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: Uuid,
    #[schema(example = "A")]
    pub prefix: String,
    #[schema(example = 2)]
    pub no: i32,
    #[schema(example = 2)]
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Linha do ledger (SeatPeriod) ---
// Uma linha por (mesa, ocorrência de período). É a unidade de reserva:
// `can_booked` é a fonte de verdade de "esta mesa está livre nesta janela".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeatPeriod {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub concrete_period_id: Uuid,
    pub can_booked: bool,
    pub can_online_booked: bool,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Candidata de alocação ---
// Projeção usada pelo motor de alocação: a linha livre do ledger já com a
// capacidade da mesa e as vizinhas combináveis agregadas.
#[derive(Debug, Clone, FromRow)]
pub struct SeatPeriodCandidate {
    pub seat_period_id: Uuid,
    pub seat_id: Uuid,
    pub prefix: String,
    pub no: i32,
    pub capacity: i32,
    pub sibling_seat_ids: Vec<Uuid>,
}
