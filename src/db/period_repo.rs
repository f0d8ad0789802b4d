// src/db/period_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::catalog::PeriodCatalog,
    models::periods::{ConcretePeriod, Period, PeriodIntervalUnit},
};

#[derive(Clone)]
pub struct PeriodRepository {
    pool: PgPool,
}

impl PeriodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PeriodCatalog for PeriodRepository {
    async fn create_template(
        &self,
        title: &str,
        interval_unit: PeriodIntervalUnit,
        interval_amount: i32,
        anchor_start: DateTime<Utc>,
        online_default: bool,
    ) -> Result<Period, AppError> {
        let period = sqlx::query_as::<_, Period>(
            r#"
            INSERT INTO periods (title, interval_unit, interval_amount, anchor_start, online_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(interval_unit)
        .bind(interval_amount)
        .bind(anchor_start)
        .bind(online_default)
        .fetch_one(&self.pool)
        .await?;
        Ok(period)
    }

    async fn find_template(&self, id: Uuid) -> Result<Option<Period>, AppError> {
        let period = sqlx::query_as::<_, Period>("SELECT * FROM periods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(period)
    }

    async fn list_templates(&self) -> Result<Vec<Period>, AppError> {
        let periods = sqlx::query_as::<_, Period>("SELECT * FROM periods ORDER BY anchor_start ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(periods)
    }

    async fn list_concrete_periods(&self, period_id: Uuid) -> Result<Vec<ConcretePeriod>, AppError> {
        let periods = sqlx::query_as::<_, ConcretePeriod>(
            "SELECT * FROM concrete_periods WHERE period_id = $1 ORDER BY started_at ASC",
        )
        .bind(period_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(periods)
    }

    async fn upsert_concrete_period(
        &self,
        period_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<(Uuid, bool), AppError> {
        // A chave natural (period_id, started_at) garante a idempotência:
        // o RETURNING só vem quando a linha é realmente nova.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO concrete_periods (period_id, started_at, ended_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (period_id, started_at) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(period_id)
        .bind(started_at)
        .bind(ended_at)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok((id, true)),
            None => {
                let id = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM concrete_periods WHERE period_id = $1 AND started_at = $2",
                )
                .bind(period_id)
                .bind(started_at)
                .fetch_one(&self.pool)
                .await?;
                Ok((id, false))
            }
        }
    }

    async fn seed_seat_periods(
        &self,
        concrete_period_id: Uuid,
        online_default: bool,
    ) -> Result<u64, AppError> {
        // Uma linha por mesa existente; mesas que entraram depois ganham a
        // linha que falta na próxima rodada da materialização.
        let result = sqlx::query(
            r#"
            INSERT INTO seat_periods (seat_id, concrete_period_id, can_booked, can_online_booked)
            SELECT s.id, $1, TRUE, $2
            FROM seats s
            ON CONFLICT (seat_id, concrete_period_id) DO NOTHING
            "#,
        )
        .bind(concrete_period_id)
        .bind(online_default)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
