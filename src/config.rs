// src/config.rs

use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    cache::{AvailabilityCache, InMemoryCache, RedisCache},
    db::{
        catalog::PeriodCatalog, ledger::SeatPeriodLedger, EmployeeRepository, LedgerRepository,
        PeriodRepository, ReservationRepository, SeatingRepository,
    },
    services::{
        AllocationService, AuthService, AvailabilityService, PeriodService, ReservationService,
        SeatingService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub auth_service: AuthService,
    pub seating_service: SeatingService,
    pub period_service: PeriodService,
    pub allocation_service: AllocationService,
    pub availability_service: AvailabilityService,
    pub reservation_service: ReservationService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // Cache de disponibilidade: Redis quando configurado; sem REDIS_URL
        // cai no cache em memória do processo (bom para desenvolvimento,
        // não compartilha snapshots entre instâncias).
        let cache: Arc<dyn AvailabilityCache> = match env::var("REDIS_URL") {
            Ok(redis_url) => {
                let redis = RedisCache::connect(&redis_url).await?;
                tracing::info!("✅ Cache de disponibilidade no Redis");
                Arc::new(redis)
            }
            Err(_) => {
                tracing::warn!("REDIS_URL ausente; usando cache de disponibilidade em memória");
                Arc::new(InMemoryCache::new())
            }
        };

        // Fuso fixo do restaurante, para o balde por dia de calendário.
        let offset_hours: i32 = env::var("RESTAURANT_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let restaurant_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("RESTAURANT_UTC_OFFSET_HOURS fora do intervalo"))?;

        // --- Monta o gráfico de dependências ---
        let ledger: Arc<dyn SeatPeriodLedger> = Arc::new(LedgerRepository::new(db_pool.clone()));
        let catalog: Arc<dyn PeriodCatalog> = Arc::new(PeriodRepository::new(db_pool.clone()));

        let auth_service = AuthService::new(
            EmployeeRepository::new(db_pool.clone()),
            jwt_secret.clone(),
        );
        let seating_service = SeatingService::new(
            SeatingRepository::new(db_pool.clone()),
            Arc::clone(&cache),
        );
        let period_service = PeriodService::new(Arc::clone(&catalog));
        let allocation_service = AllocationService::new(Arc::clone(&ledger), Arc::clone(&cache));
        let availability_service =
            AvailabilityService::new(Arc::clone(&ledger), Arc::clone(&cache), restaurant_offset);
        let reservation_service =
            ReservationService::new(ReservationRepository::new(db_pool.clone()));

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            seating_service,
            period_service,
            allocation_service,
            availability_service,
            reservation_service,
        })
    }
}
