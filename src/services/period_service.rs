// src/services/period_service.rs

use chrono::{DateTime, Duration, Months, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::catalog::PeriodCatalog,
    models::periods::{ConcretePeriod, MaterializationReport, Period, PeriodIntervalUnit},
};

// Duração fixa de uma sessão de refeição: fim = início + 2h.
const SESSION_DURATION_MINUTES: i64 = 120;

#[derive(Clone)]
pub struct PeriodService {
    catalog: Arc<dyn PeriodCatalog>,
}

impl PeriodService {
    pub fn new(catalog: Arc<dyn PeriodCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn create_template(
        &self,
        title: &str,
        interval_unit: PeriodIntervalUnit,
        interval_amount: i32,
        anchor_start: DateTime<Utc>,
        online_default: bool,
    ) -> Result<Period, AppError> {
        self.catalog
            .create_template(title, interval_unit, interval_amount, anchor_start, online_default)
            .await
    }

    pub async fn list_templates(&self) -> Result<Vec<Period>, AppError> {
        self.catalog.list_templates().await
    }

    pub async fn list_concrete_periods(&self, period_id: Uuid) -> Result<Vec<ConcretePeriod>, AppError> {
        self.catalog
            .find_template(period_id)
            .await?
            .ok_or(AppError::PeriodNotFound)?;
        self.catalog.list_concrete_periods(period_id).await
    }

    // Expande a recorrência do modelo até o horizonte e cria, para cada
    // ocorrência, o período concreto e uma linha do ledger por mesa. Cada
    // passo é um upsert por chave natural: rodar de novo (ou retomar depois
    // de uma queda no meio) só preenche o que falta.
    pub async fn materialize_periods(
        &self,
        template_id: Uuid,
        horizon_end: DateTime<Utc>,
    ) -> Result<MaterializationReport, AppError> {
        let template = self
            .catalog
            .find_template(template_id)
            .await?
            .ok_or(AppError::PeriodNotFound)?;

        let mut report = MaterializationReport { created_periods: 0, created_seat_periods: 0 };

        for started_at in expand_recurrence(
            template.anchor_start,
            template.interval_unit,
            template.interval_amount,
            horizon_end,
        ) {
            let ended_at = started_at + Duration::minutes(SESSION_DURATION_MINUTES);
            let (concrete_period_id, created) = self
                .catalog
                .upsert_concrete_period(template.id, started_at, ended_at)
                .await?;
            if created {
                report.created_periods += 1;
            }
            report.created_seat_periods += self
                .catalog
                .seed_seat_periods(concrete_period_id, template.online_default)
                .await?;
        }

        tracing::info!(
            "Materialização de '{}': {} período(s) e {} linha(s) de ledger criados",
            template.title,
            report.created_periods,
            report.created_seat_periods
        );

        Ok(report)
    }
}

// Passos da recorrência a partir da âncora, parando quando o início gerado
// passa do horizonte (início == horizonte ainda entra).
fn expand_recurrence(
    anchor_start: DateTime<Utc>,
    interval_unit: PeriodIntervalUnit,
    interval_amount: i32,
    horizon_end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut starts = Vec::new();
    let mut current = anchor_start;
    while current <= horizon_end {
        starts.push(current);
        let next = match interval_unit {
            PeriodIntervalUnit::Day => current.checked_add_signed(Duration::days(interval_amount as i64)),
            PeriodIntervalUnit::Week => current.checked_add_signed(Duration::weeks(interval_amount as i64)),
            PeriodIntervalUnit::Month => current.checked_add_months(Months::new(interval_amount as u32)),
        };
        match next {
            // Cadência zerada ou estouro de data: melhor parar do que rodar
            // para sempre.
            Some(n) if n > current => current = n,
            _ => break,
        }
    }
    starts
}
