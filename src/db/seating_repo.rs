// src/db/seating_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::seating::{Seat, SeatPeriod},
};

#[derive(Clone)]
pub struct SeatingRepository {
    pool: PgPool,
}

impl SeatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Topologia: mesas
    // ---

    pub async fn create_seat(&self, prefix: &str, no: i32, capacity: i32) -> Result<Seat, AppError> {
        sqlx::query_as::<_, Seat>(
            r#"
            INSERT INTO seats (prefix, no, capacity)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(prefix)
        .bind(no)
        .bind(capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SeatAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn find_seat(&self, id: Uuid) -> Result<Option<Seat>, AppError> {
        let seat = sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(seat)
    }

    pub async fn list_seats(&self) -> Result<Vec<Seat>, AppError> {
        let seats = sqlx::query_as::<_, Seat>("SELECT * FROM seats ORDER BY prefix ASC, no ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(seats)
    }

    // ---
    // Topologia: ligações de combinação
    // ---

    // Ligação dirigida; repetir a mesma ligação é inofensivo.
    pub async fn link_sibling(&self, seat_id: Uuid, sibling_seat_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO seat_siblings (seat_id, sibling_seat_id)
            VALUES ($1, $2)
            ON CONFLICT (seat_id, sibling_seat_id) DO NOTHING
            "#,
        )
        .bind(seat_id)
        .bind(sibling_seat_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_siblings(&self, seat_id: Uuid) -> Result<Vec<Seat>, AppError> {
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT s.*
            FROM seat_siblings ss
            JOIN seats s ON s.id = ss.sibling_seat_id
            WHERE ss.seat_id = $1
            ORDER BY s.prefix ASC, s.no ASC
            "#,
        )
        .bind(seat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }

    // ---
    // Ledger: bloqueio/desbloqueio de operador
    // ---

    pub async fn list_seat_periods(&self, concrete_period_id: Uuid) -> Result<Vec<SeatPeriod>, AppError> {
        let rows = sqlx::query_as::<_, SeatPeriod>(
            r#"
            SELECT sp.*
            FROM seat_periods sp
            JOIN seats s ON s.id = sp.seat_id
            WHERE sp.concrete_period_id = $1
            ORDER BY s.prefix ASC, s.no ASC
            "#,
        )
        .bind(concrete_period_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Ajuste de operador numa linha do ledger. Mexer em `can_booked` só é
    // permitido quando nenhuma reserva ativa reivindica a linha: o operador
    // bloqueia/desbloqueia mesas livres, nunca por cima de uma reserva.
    pub async fn update_seat_period(
        &self,
        id: Uuid,
        can_booked: Option<bool>,
        can_online_booked: Option<bool>,
    ) -> Result<SeatPeriod, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Tranca a linha para a checagem não correr contra uma alocação.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM seat_periods WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::SeatPeriodNotFound)?;

        // 2. Se vamos mexer no flag de reserva, a linha não pode estar
        // reivindicada por uma reserva ativa.
        if can_booked.is_some() {
            let claimed = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM reservation_seat_periods rsp
                    JOIN reservation_logs r ON r.id = rsp.reservation_id
                    WHERE rsp.seat_period_id = $1 AND r.cancelled_at IS NULL
                )
                "#,
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if claimed {
                return Err(AppError::ConcurrentConflict);
            }
        }

        // 3. Aplica o ajuste.
        let updated = sqlx::query_as::<_, SeatPeriod>(
            r#"
            UPDATE seat_periods
            SET can_booked = COALESCE($2, can_booked),
                can_online_booked = COALESCE($3, can_online_booked),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(can_booked)
        .bind(can_online_booked)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }
}
