// src/db/catalog.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::periods::{ConcretePeriod, Period, PeriodIntervalUnit},
};

// Catálogo de períodos: modelos de recorrência e as ocorrências concretas
// que a materialização gera. Os upserts usam a chave natural, então rodar a
// materialização duas vezes sobre a mesma janela não duplica nada.
#[async_trait]
pub trait PeriodCatalog: Send + Sync {
    async fn create_template(
        &self,
        title: &str,
        interval_unit: PeriodIntervalUnit,
        interval_amount: i32,
        anchor_start: DateTime<Utc>,
        online_default: bool,
    ) -> Result<Period, AppError>;

    async fn find_template(&self, id: Uuid) -> Result<Option<Period>, AppError>;

    async fn list_templates(&self) -> Result<Vec<Period>, AppError>;

    async fn list_concrete_periods(&self, period_id: Uuid) -> Result<Vec<ConcretePeriod>, AppError>;

    // Devolve (id, true) se criou, (id existente, false) se já estava lá.
    async fn upsert_concrete_period(
        &self,
        period_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<(Uuid, bool), AppError>;

    // Cria a linha do ledger que falta para cada mesa existente; devolve
    // quantas linhas novas entraram.
    async fn seed_seat_periods(
        &self,
        concrete_period_id: Uuid,
        online_default: bool,
    ) -> Result<u64, AppError>;
}
