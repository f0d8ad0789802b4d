// src/models/reservations.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Canal da reserva ---
// A classificação vem da camada de sessão e o motor confia nela: pedidos sem
// funcionário autenticado são sempre ONLINE_BOOKING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reservation_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationType {
    OnlineBooking,
    PhoneBooking,
    WalkInSeating,
}

impl ReservationType {
    // Só o canal online respeita o filtro `can_online_booked`; telefone e
    // walk-in podem reservar qualquer linha livre do ledger.
    pub fn is_online(&self) -> bool {
        matches!(self, ReservationType::OnlineBooking)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationType::OnlineBooking => "ONLINE_BOOKING",
            ReservationType::PhoneBooking => "PHONE_BOOKING",
            ReservationType::WalkInSeating => "WALK_IN_SEATING",
        }
    }
}

// --- Reserva (um registro por tentativa bem-sucedida) ---
// `start_of_meal`/`end_of_meal` ficam nulos até o grupo sentar/sair; esses
// fluxos de salão nunca mexem nas mesas atribuídas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationLog {
    pub id: Uuid,
    #[schema(example = 4)]
    pub party_size: i32,
    pub reservation_type: ReservationType,
    // Payload livre: contato, observações da recepção etc.
    pub options: serde_json::Value,
    pub start_of_meal: Option<DateTime<Utc>>,
    pub end_of_meal: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Dados de criação (montados pelo motor, não pelo handler) ---
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub party_size: i32,
    pub reservation_type: ReservationType,
    pub options: serde_json::Value,
}

// --- Resultado da alocação ---
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedSeat {
    pub seat_id: Uuid,
    pub seat_period_id: Uuid,
    #[schema(example = "A")]
    pub prefix: String,
    #[schema(example = 2)]
    pub no: i32,
    #[schema(example = 2)]
    pub capacity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub reservation: ReservationLog,
    // 1 mesa para grupos de até 2 (ou de 7 a 10); 2 mesas vizinhas para 3-4.
    pub seats: Vec<AllocatedSeat>,
}

// --- Visão da recepção ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: ReservationLog,
    pub seats: Vec<AllocatedSeat>,
}
