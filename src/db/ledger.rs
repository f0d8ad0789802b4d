// src/db/ledger.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        availability::PeriodAvailability,
        periods::ConcretePeriod,
        reservations::{NewReservation, ReservationLog},
        seating::SeatPeriodCandidate,
    },
};

// Contrato de leitura/escrita do ledger de mesa-período. O motor de alocação
// só conversa com esta interface: em produção quem responde é o Postgres
// (LedgerRepository); nos testes, um ledger em memória com a mesma semântica
// de compare-and-swap.
#[async_trait]
pub trait SeatPeriodLedger: Send + Sync {
    async fn find_concrete_period(&self, id: Uuid) -> Result<Option<ConcretePeriod>, AppError>;

    // Linhas livres do período, já com capacidade e vizinhas combináveis.
    // A ordem de retorno é a ordem natural do ledger (prefixo, número) e o
    // motor aceita a PRIMEIRA candidata que servir, sem ranking de mesa.
    async fn free_candidates(
        &self,
        concrete_period_id: Uuid,
        online_only: bool,
    ) -> Result<Vec<SeatPeriodCandidate>, AppError>;

    // Capacidade total/disponível por ocorrência no intervalo [from, to),
    // em ordem ascendente de início. Períodos sem nenhuma linha elegível
    // para o canal são omitidos.
    async fn period_loads(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        online_only: bool,
    ) -> Result<Vec<PeriodAvailability>, AppError>;

    async fn find_reservation(&self, id: Uuid) -> Result<Option<ReservationLog>, AppError>;

    async fn reservation_seat_period_ids(&self, reservation_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    // Abre a unidade de trabalho transacional. Tudo que acontece dentro dela
    // é confirmado ou desfeito em bloco.
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, AppError>;
}

// Unidade de trabalho de uma alocação (ou cancelamento). A re-checagem
// otimista mora em `claim_seat_period`: flipar `can_booked` só conta se a
// linha ainda estava livre DENTRO da transação; se outra reserva chegou
// primeiro, devolve `false` e o chamador aborta tudo.
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    // Compare-and-swap: `true` se esta transação reivindicou a linha.
    async fn claim_seat_period(&mut self, seat_period_id: Uuid) -> Result<bool, AppError>;

    // Caminho inverso (cancelamento): devolve a linha ao estado livre.
    async fn release_seat_period(&mut self, seat_period_id: Uuid) -> Result<(), AppError>;

    async fn insert_reservation(&mut self, data: &NewReservation) -> Result<ReservationLog, AppError>;

    async fn attach_seat_period(
        &mut self,
        reservation_id: Uuid,
        seat_period_id: Uuid,
    ) -> Result<(), AppError>;

    // Compare-and-swap no cancelamento: `false` se alguém cancelou antes.
    async fn mark_cancelled(&mut self, reservation_id: Uuid) -> Result<bool, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}
