// src/db/ledger_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ledger::{LedgerUnitOfWork, SeatPeriodLedger},
    models::{
        availability::PeriodAvailability,
        periods::ConcretePeriod,
        reservations::{NewReservation, ReservationLog},
        seating::SeatPeriodCandidate,
    },
};

#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatPeriodLedger for LedgerRepository {
    async fn find_concrete_period(&self, id: Uuid) -> Result<Option<ConcretePeriod>, AppError> {
        let period = sqlx::query_as::<_, ConcretePeriod>(
            "SELECT * FROM concrete_periods WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(period)
    }

    async fn free_candidates(
        &self,
        concrete_period_id: Uuid,
        online_only: bool,
    ) -> Result<Vec<SeatPeriodCandidate>, AppError> {
        // A ordem (prefixo, número) É o critério de desempate do motor:
        // quem aparecer primeiro leva, sem ranking de qualidade de mesa.
        let candidates = sqlx::query_as::<_, SeatPeriodCandidate>(
            r#"
            SELECT sp.id AS seat_period_id,
                   s.id AS seat_id,
                   s.prefix,
                   s.no,
                   s.capacity,
                   COALESCE(
                       ARRAY_AGG(ss.sibling_seat_id) FILTER (WHERE ss.sibling_seat_id IS NOT NULL),
                       '{}'::uuid[]
                   ) AS sibling_seat_ids
            FROM seat_periods sp
            JOIN seats s ON s.id = sp.seat_id
            LEFT JOIN seat_siblings ss ON ss.seat_id = s.id
            WHERE sp.concrete_period_id = $1
              AND sp.can_booked = TRUE
              AND ($2 = FALSE OR sp.can_online_booked = TRUE)
            GROUP BY sp.id, s.id, s.prefix, s.no, s.capacity
            ORDER BY s.prefix ASC, s.no ASC
            "#,
        )
        .bind(concrete_period_id)
        .bind(online_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    async fn period_loads(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        online_only: bool,
    ) -> Result<Vec<PeriodAvailability>, AppError> {
        // Intervalo meio-aberto [from, to). O JOIN com o filtro de canal já
        // omite períodos sem nenhuma linha elegível; nunca emitimos zeros.
        let loads = sqlx::query_as::<_, PeriodAvailability>(
            r#"
            SELECT cp.id AS concrete_period_id,
                   cp.started_at,
                   cp.ended_at,
                   SUM(s.capacity)::BIGINT AS total_capacity,
                   COALESCE(SUM(s.capacity) FILTER (WHERE sp.can_booked), 0)::BIGINT AS available_capacity
            FROM concrete_periods cp
            JOIN seat_periods sp ON sp.concrete_period_id = cp.id
            JOIN seats s ON s.id = sp.seat_id
            WHERE cp.started_at >= $1
              AND cp.started_at < $2
              AND ($3 = FALSE OR sp.can_online_booked = TRUE)
            GROUP BY cp.id, cp.started_at, cp.ended_at
            ORDER BY cp.started_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(online_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(loads)
    }

    async fn find_reservation(&self, id: Uuid) -> Result<Option<ReservationLog>, AppError> {
        let reservation = sqlx::query_as::<_, ReservationLog>(
            "SELECT * FROM reservation_logs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reservation)
    }

    async fn reservation_seat_period_ids(&self, reservation_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT seat_period_id FROM reservation_seat_periods WHERE reservation_id = $1",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerUnitOfWork { tx }))
    }
}

// Unidade de trabalho por cima de uma transação do Postgres. Se o chamador
// sumir sem commit (timeout, pânico), o Drop da transação faz o rollback:
// nenhum flip parcial sobrevive.
struct PgLedgerUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnitOfWork for PgLedgerUnitOfWork {
    async fn claim_seat_period(&mut self, seat_period_id: Uuid) -> Result<bool, AppError> {
        // O `can_booked = TRUE` no WHERE é a re-checagem otimista: se outra
        // transação já flipou e commitou, afetamos zero linhas; se ela ainda
        // não commitou, o Postgres nos segura e depois devolve zero do mesmo
        // jeito. Exatamente uma das transações concorrentes ganha.
        let result = sqlx::query(
            r#"
            UPDATE seat_periods
            SET can_booked = FALSE, updated_at = now()
            WHERE id = $1 AND can_booked = TRUE
            "#,
        )
        .bind(seat_period_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_seat_period(&mut self, seat_period_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE seat_periods
            SET can_booked = TRUE, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(seat_period_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_reservation(&mut self, data: &NewReservation) -> Result<ReservationLog, AppError> {
        let reservation = sqlx::query_as::<_, ReservationLog>(
            r#"
            INSERT INTO reservation_logs (party_size, reservation_type, options)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.party_size)
        .bind(data.reservation_type)
        .bind(&data.options)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(reservation)
    }

    async fn attach_seat_period(
        &mut self,
        reservation_id: Uuid,
        seat_period_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO reservation_seat_periods (reservation_id, seat_period_id) VALUES ($1, $2)",
        )
        .bind(reservation_id)
        .bind(seat_period_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn mark_cancelled(&mut self, reservation_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE reservation_logs
            SET cancelled_at = now()
            WHERE id = $1 AND cancelled_at IS NULL
            "#,
        )
        .bind(reservation_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
