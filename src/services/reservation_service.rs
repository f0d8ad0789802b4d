// src/services/reservation_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ReservationRepository,
    models::reservations::{ReservationDetail, ReservationLog},
};

// Fluxos de salão: consulta e carimbos de chegada/saída. Nada aqui toca nas
// mesas atribuídas: isso é território exclusivo do motor de alocação e do
// cancelamento.
#[derive(Clone)]
pub struct ReservationService {
    repo: ReservationRepository,
}

impl ReservationService {
    pub fn new(repo: ReservationRepository) -> Self {
        Self { repo }
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<ReservationDetail, AppError> {
        let reservation = self.repo.find(id).await?.ok_or(AppError::ReservationNotFound)?;
        let seats = self.repo.allocated_seats(id).await?;
        Ok(ReservationDetail { reservation, seats })
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<ReservationLog>, AppError> {
        self.repo.list_recent(limit).await
    }

    pub async fn mark_seated(&self, id: Uuid) -> Result<ReservationLog, AppError> {
        self.repo.mark_seated(id).await
    }

    pub async fn mark_departed(&self, id: Uuid) -> Result<ReservationLog, AppError> {
        self.repo.mark_departed(id).await
    }
}
