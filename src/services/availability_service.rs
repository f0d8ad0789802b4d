// src/services/availability_service.rs

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

use crate::{
    cache::AvailabilityCache,
    common::error::AppError,
    db::ledger::SeatPeriodLedger,
    models::{
        availability::{AvailabilityRange, DatePeriodAvailability, PeriodAvailability},
        reservations::ReservationType,
    },
};

// TTLs do snapshot. Consulta por dia não carrega hora na chave, então pode
// viver meio dia; consulta por instante exato expira em minutos.
const TTL_DATE_ONLY: std::time::Duration = std::time::Duration::from_secs(12 * 60 * 60);
const TTL_EXACT: std::time::Duration = std::time::Duration::from_secs(5 * 60);

#[derive(Clone)]
pub struct AvailabilityService {
    ledger: Arc<dyn SeatPeriodLedger>,
    cache: Arc<dyn AvailabilityCache>,
    // Fuso fixo do restaurante: o balde do dia usa a data LOCAL do início do
    // período, nunca a data UTC, senão o jantar das 23h cai no dia errado.
    restaurant_offset: FixedOffset,
}

impl AvailabilityService {
    pub fn new(
        ledger: Arc<dyn SeatPeriodLedger>,
        cache: Arc<dyn AvailabilityCache>,
        restaurant_offset: FixedOffset,
    ) -> Self {
        Self { ledger, cache, restaurant_offset }
    }

    // Cache-aside: acerto devolve o snapshot deserializado como está; erro ou
    // ausência recalcula do ledger e tenta gravar de volta. Problema de cache
    // NUNCA falha a consulta; só problema de ledger falha.
    pub async fn get_availability(
        &self,
        channel: ReservationType,
        range: AvailabilityRange,
    ) -> Result<Vec<DatePeriodAvailability>, AppError> {
        let key = range.cache_key(channel);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<DatePeriodAvailability>>(&raw) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) => {
                    tracing::warn!("Snapshot corrompido em {}; recalculando: {}", key, e)
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache indisponível na leitura de {}: {}", key, e),
        }

        let (from, to) = self.bounds(&range)?;
        let loads = self.ledger.period_loads(from, to, channel.is_online()).await?;
        let days = self.bucket_by_day(loads);

        let ttl = match range {
            AvailabilityRange::DateOnly { .. } => TTL_DATE_ONLY,
            AvailabilityRange::Exact { .. } => TTL_EXACT,
        };
        match serde_json::to_string(&days) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(&key, &raw, ttl).await {
                    tracing::warn!("Cache indisponível na escrita de {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("Falha ao serializar snapshot de {}: {}", key, e),
        }

        Ok(days)
    }

    // Normaliza o intervalo para [from, to) em UTC. Datas de calendário são
    // interpretadas no fuso do restaurante: o dia `to` entra inteiro.
    fn bounds(&self, range: &AvailabilityRange) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        match range {
            AvailabilityRange::Exact { from, to } => {
                if from > to {
                    return Err(AppError::InvalidDateRange(
                        "data inicial depois da final".to_string(),
                    ));
                }
                Ok((*from, *to))
            }
            AvailabilityRange::DateOnly { from, to } => {
                if from > to {
                    return Err(AppError::InvalidDateRange(
                        "data inicial depois da final".to_string(),
                    ));
                }
                let start = self.local_midnight(*from)?;
                let end = self.local_midnight(*to + Duration::days(1))?;
                Ok((start, end))
            }
        }
    }

    fn local_midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>, AppError> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("meia-noite inválida para {}", date))?;
        let local = midnight
            .and_local_timezone(self.restaurant_offset)
            .single()
            .ok_or_else(|| anyhow::anyhow!("data fora do fuso fixo: {}", date))?;
        Ok(local.with_timezone(&Utc))
    }

    // Agrupa as ocorrências (já ordenadas por início) em baldes por dia de
    // calendário local. Dias sem ocorrência simplesmente não aparecem.
    fn bucket_by_day(&self, loads: Vec<PeriodAvailability>) -> Vec<DatePeriodAvailability> {
        let mut days: Vec<DatePeriodAvailability> = Vec::new();
        for load in loads {
            let date = load.started_at.with_timezone(&self.restaurant_offset).date_naive();
            match days.last_mut() {
                Some(day) if day.date == date => {
                    day.total_capacity += load.total_capacity;
                    day.available_capacity += load.available_capacity;
                    day.periods.push(load);
                }
                _ => days.push(DatePeriodAvailability {
                    date,
                    total_capacity: load.total_capacity,
                    available_capacity: load.available_capacity,
                    periods: vec![load],
                }),
            }
        }
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheError, InMemoryCache};
    use crate::db::memory::MemLedger;
    use crate::services::AllocationService;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).expect("offset válido")
    }

    fn service_with(
        ledger: &MemLedger,
        cache: Arc<dyn AvailabilityCache>,
        offset_hours: i32,
    ) -> AvailabilityService {
        AvailabilityService::new(Arc::new(ledger.clone()), cache, offset(offset_hours))
    }

    fn day_range(from: (i32, u32, u32), to: (i32, u32, u32)) -> AvailabilityRange {
        AvailabilityRange::DateOnly {
            from: NaiveDate::from_ymd_opt(from.0, from.1, from.2).expect("data válida"),
            to: NaiveDate::from_ymd_opt(to.0, to.1, to.2).expect("data válida"),
        }
    }

    #[tokio::test]
    async fn intervalo_sem_periodos_devolve_vazio() {
        let ledger = MemLedger::new();
        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);

        let days = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 1), (2026, 9, 7)))
            .await
            .expect("vazio não é erro");
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn agrega_total_e_disponivel_por_periodo() {
        let ledger = MemLedger::new();
        let a1 = ledger.add_seat("A", 1, 2);
        let a2 = ledger.add_seat("A", 2, 2);
        let b1 = ledger.add_seat("B", 1, 10);
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        ledger.add_seat_period(a1, period, true, true);
        // A2 já reservada: sai do disponível, continua no total.
        ledger.add_seat_period(a2, period, false, true);
        ledger.add_seat_period(b1, period, true, true);

        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);
        let days = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 5), (2026, 9, 5)))
            .await
            .expect("consulta passa");

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 9, 5).unwrap());
        assert_eq!(days[0].total_capacity, 14);
        assert_eq!(days[0].available_capacity, 12);
        assert_eq!(days[0].periods.len(), 1);
    }

    #[tokio::test]
    async fn canal_online_so_ve_linhas_elegiveis() {
        let ledger = MemLedger::new();
        let a1 = ledger.add_seat("A", 1, 2);
        let a2 = ledger.add_seat("A", 2, 4);
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        ledger.add_seat_period(a1, period, true, true);
        // Fechada para online: não conta nem no total do canal online.
        ledger.add_seat_period(a2, period, true, false);

        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);
        let online = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 5), (2026, 9, 5)))
            .await
            .expect("consulta passa");
        assert_eq!(online[0].total_capacity, 2);

        let walkin = svc
            .get_availability(ReservationType::WalkInSeating, day_range((2026, 9, 5), (2026, 9, 5)))
            .await
            .expect("consulta passa");
        assert_eq!(walkin[0].total_capacity, 6);
    }

    #[tokio::test]
    async fn balde_do_dia_usa_o_fuso_do_restaurante() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        // 23:30 UTC de 5/9 = 01:30 locais de 6/9 com offset +2.
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 23, 30, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        ledger.add_seat_period(seat, period, true, true);

        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 2);
        let days = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 6), (2026, 9, 6)))
            .await
            .expect("consulta passa");

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 9, 6).unwrap());
    }

    #[tokio::test]
    async fn dois_periodos_no_mesmo_dia_ficam_no_mesmo_balde() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        let lunch = ledger.add_concrete_period(Utc.with_ymd_and_hms(2026, 9, 5, 12, 0, 0).unwrap());
        let dinner = ledger.add_concrete_period(Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap());
        ledger.add_seat_period(seat, lunch, true, true);
        ledger.add_seat_period(seat, dinner, true, true);

        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);
        let days = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 5), (2026, 9, 5)))
            .await
            .expect("consulta passa");

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].periods.len(), 2);
        assert_eq!(days[0].total_capacity, 4);
        // Ordenação ascendente dentro do dia.
        assert!(days[0].periods[0].started_at < days[0].periods[1].started_at);
    }

    #[tokio::test]
    async fn granularidade_exata_usa_o_intervalo_meio_aberto() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        let inside = ledger.add_concrete_period(Utc.with_ymd_and_hms(2026, 9, 5, 12, 0, 0).unwrap());
        let boundary = ledger.add_concrete_period(Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap());
        ledger.add_seat_period(seat, inside, true, true);
        ledger.add_seat_period(seat, boundary, true, true);

        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);
        let range = AvailabilityRange::Exact {
            from: Utc.with_ymd_and_hms(2026, 9, 5, 11, 0, 0).unwrap(),
            // O início às 19h fica exatamente na borda e cai fora.
            to: Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap(),
        };
        let days = svc
            .get_availability(ReservationType::OnlineBooking, range)
            .await
            .expect("consulta passa");

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].periods.len(), 1);
        assert_eq!(
            days[0].periods[0].started_at,
            Utc.with_ymd_and_hms(2026, 9, 5, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn acerto_de_cache_nao_recalcula() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        let sp = ledger.add_seat_period(seat, period, true, true);

        let cache = Arc::new(InMemoryCache::new());
        let svc = service_with(&ledger, cache.clone(), 0);
        let range = day_range((2026, 9, 5), (2026, 9, 5));

        let first = svc
            .get_availability(ReservationType::OnlineBooking, range)
            .await
            .expect("consulta passa");
        assert_eq!(first[0].available_capacity, 2);

        // Mexe no ledger POR FORA do motor (sem invalidação): o snapshot
        // antigo continua valendo até o TTL (eventualmente consistente).
        ledger.set_can_booked(sp, false);

        let second = svc
            .get_availability(ReservationType::OnlineBooking, range)
            .await
            .expect("consulta passa");
        assert_eq!(second[0].available_capacity, 2, "serviu do cache, sem recálculo");
    }

    #[tokio::test]
    async fn alocacao_invalida_o_snapshot() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        ledger.add_seat_period(seat, period, true, true);

        let cache: Arc<dyn AvailabilityCache> = Arc::new(InMemoryCache::new());
        let availability = service_with(&ledger, cache.clone(), 0);
        let allocation = AllocationService::new(Arc::new(ledger.clone()), cache.clone());
        let range = day_range((2026, 9, 5), (2026, 9, 5));

        let before = availability
            .get_availability(ReservationType::OnlineBooking, range)
            .await
            .expect("consulta passa");
        assert_eq!(before[0].available_capacity, 2);

        allocation
            .allocate(2, ReservationType::OnlineBooking, period, json!({}))
            .await
            .expect("alocação passa");

        // A alocação derrubou o snapshot: a próxima leitura recalcula.
        let after = availability
            .get_availability(ReservationType::OnlineBooking, range)
            .await
            .expect("consulta passa");
        assert_eq!(after[0].available_capacity, 0);
    }

    // Cache que sempre falha, para o caminho de degradação.
    struct BrokenCache;

    #[async_trait]
    impl AvailabilityCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend(redis::RedisError::from(std::io::Error::other(
                "cache fora do ar",
            ))))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: std::time::Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend(redis::RedisError::from(std::io::Error::other(
                "cache fora do ar",
            ))))
        }
        async fn delete_by_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
            Err(CacheError::Backend(redis::RedisError::from(std::io::Error::other(
                "cache fora do ar",
            ))))
        }
    }

    #[tokio::test]
    async fn cache_quebrado_degrada_para_o_ledger() {
        let ledger = MemLedger::new();
        let seat = ledger.add_seat("A", 1, 2);
        let start = Utc.with_ymd_and_hms(2026, 9, 5, 19, 0, 0).unwrap();
        let period = ledger.add_concrete_period(start);
        ledger.add_seat_period(seat, period, true, true);

        let svc = service_with(&ledger, Arc::new(BrokenCache), 0);
        let days = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 5), (2026, 9, 5)))
            .await
            .expect("falha de cache não derruba a consulta");
        assert_eq!(days[0].available_capacity, 2);
    }

    #[tokio::test]
    async fn intervalo_invertido_e_rejeitado() {
        let ledger = MemLedger::new();
        let svc = service_with(&ledger, Arc::new(InMemoryCache::new()), 0);
        let err = svc
            .get_availability(ReservationType::OnlineBooking, day_range((2026, 9, 7), (2026, 9, 1)))
            .await
            .expect_err("from > to");
        assert!(matches!(err, AppError::InvalidDateRange(_)));
    }
}
