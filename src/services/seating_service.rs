// src/services/seating_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cache::AvailabilityCache,
    common::error::AppError,
    db::SeatingRepository,
    models::seating::{Seat, SeatPeriod},
    services::allocation_service::AVAILABILITY_KEY_PATTERN,
};

#[derive(Clone)]
pub struct SeatingService {
    repo: SeatingRepository,
    cache: Arc<dyn AvailabilityCache>,
}

impl SeatingService {
    pub fn new(repo: SeatingRepository, cache: Arc<dyn AvailabilityCache>) -> Self {
        Self { repo, cache }
    }

    pub async fn create_seat(&self, prefix: &str, no: i32, capacity: i32) -> Result<Seat, AppError> {
        self.repo.create_seat(prefix, no, capacity).await
    }

    pub async fn list_seats(&self) -> Result<Vec<Seat>, AppError> {
        self.repo.list_seats().await
    }

    // Declara que `seat_id` pode ser combinada com `sibling_seat_id`. A
    // ligação é dirigida; `bidirectional` grava a volta junto.
    pub async fn link_sibling(
        &self,
        seat_id: Uuid,
        sibling_seat_id: Uuid,
        bidirectional: bool,
    ) -> Result<(), AppError> {
        self.repo.find_seat(seat_id).await?.ok_or(AppError::SeatNotFound)?;
        self.repo.find_seat(sibling_seat_id).await?.ok_or(AppError::SeatNotFound)?;

        self.repo.link_sibling(seat_id, sibling_seat_id).await?;
        if bidirectional {
            self.repo.link_sibling(sibling_seat_id, seat_id).await?;
        }
        Ok(())
    }

    pub async fn list_siblings(&self, seat_id: Uuid) -> Result<Vec<Seat>, AppError> {
        self.repo.find_seat(seat_id).await?.ok_or(AppError::SeatNotFound)?;
        self.repo.list_siblings(seat_id).await
    }

    pub async fn list_seat_periods(&self, concrete_period_id: Uuid) -> Result<Vec<SeatPeriod>, AppError> {
        self.repo.list_seat_periods(concrete_period_id).await
    }

    // Bloqueio/desbloqueio de operador numa linha do ledger. É uma mutação
    // do ledger como outra qualquer: o snapshot agregado tem que cair junto.
    pub async fn update_seat_period(
        &self,
        id: Uuid,
        can_booked: Option<bool>,
        can_online_booked: Option<bool>,
    ) -> Result<SeatPeriod, AppError> {
        let updated = self.repo.update_seat_period(id, can_booked, can_online_booked).await?;

        if let Err(e) = self.cache.delete_by_pattern(AVAILABILITY_KEY_PATTERN).await {
            tracing::warn!("Falha ao invalidar o cache de disponibilidade: {}", e);
        }

        Ok(updated)
    }
}
