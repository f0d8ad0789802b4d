// src/db/reservation_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reservations::{AllocatedSeat, ReservationLog},
};

#[derive(Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<ReservationLog>, AppError> {
        let reservation = sqlx::query_as::<_, ReservationLog>(
            "SELECT * FROM reservation_logs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reservation)
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ReservationLog>, AppError> {
        let reservations = sqlx::query_as::<_, ReservationLog>(
            "SELECT * FROM reservation_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    // Mesas que a reserva reivindicou, para a visão da recepção.
    pub async fn allocated_seats(&self, reservation_id: Uuid) -> Result<Vec<AllocatedSeat>, AppError> {
        let seats = sqlx::query_as::<_, AllocatedSeat>(
            r#"
            SELECT s.id AS seat_id,
                   sp.id AS seat_period_id,
                   s.prefix,
                   s.no,
                   s.capacity
            FROM reservation_seat_periods rsp
            JOIN seat_periods sp ON sp.id = rsp.seat_period_id
            JOIN seats s ON s.id = sp.seat_id
            WHERE rsp.reservation_id = $1
            ORDER BY s.prefix ASC, s.no ASC
            "#,
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    // Carimbos do salão. Idempotentes de propósito (COALESCE): marcar a
    // chegada duas vezes não reescreve o horário. Nada aqui toca nas
    // mesas atribuídas.
    pub async fn mark_seated(&self, id: Uuid) -> Result<ReservationLog, AppError> {
        let updated = sqlx::query_as::<_, ReservationLog>(
            r#"
            UPDATE reservation_logs
            SET start_of_meal = COALESCE(start_of_meal, now())
            WHERE id = $1 AND cancelled_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(reservation) => Ok(reservation),
            // Zero linhas: ou não existe, ou foi cancelada.
            None => match self.find(id).await? {
                Some(_) => Err(AppError::ReservationAlreadyCancelled),
                None => Err(AppError::ReservationNotFound),
            },
        }
    }

    pub async fn mark_departed(&self, id: Uuid) -> Result<ReservationLog, AppError> {
        let updated = sqlx::query_as::<_, ReservationLog>(
            r#"
            UPDATE reservation_logs
            SET end_of_meal = COALESCE(end_of_meal, now())
            WHERE id = $1 AND cancelled_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(reservation) => Ok(reservation),
            None => match self.find(id).await? {
                Some(_) => Err(AppError::ReservationAlreadyCancelled),
                None => Err(AppError::ReservationNotFound),
            },
        }
    }
}
