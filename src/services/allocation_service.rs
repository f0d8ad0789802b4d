// src/services/allocation_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    cache::AvailabilityCache,
    common::error::AppError,
    db::ledger::SeatPeriodLedger,
    models::{
        reservations::{AllocatedSeat, AllocationResult, NewReservation, ReservationLog, ReservationType},
        seating::SeatPeriodCandidate,
    },
};

// Todo padrão de chave que o agregador grava começa com este prefixo; é o
// que a invalidação em massa derruba depois de cada escrita no ledger.
pub const AVAILABILITY_KEY_PATTERN: &str = "availability:*";

// Tabela fixa de formatos de mesa, não um bin-packing genérico. Grupos de
// 5-6 caem no buraco entre a dupla de mesas de 2 e o mesão de 10, e o salão
// simplesmente não atende.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeatPlan {
    // 1-2 pessoas: uma mesa de 2 lugares.
    SingleDouble,
    // 3-4 pessoas: uma mesa de 2 + a vizinha declarada, as duas livres.
    SiblingPair,
    // 7-10 pessoas: o mesão de 10 lugares.
    LargeTable,
}

impl SeatPlan {
    fn for_party_size(party_size: i32) -> Result<SeatPlan, AppError> {
        match party_size {
            1..=2 => Ok(SeatPlan::SingleDouble),
            3..=4 => Ok(SeatPlan::SiblingPair),
            7..=10 => Ok(SeatPlan::LargeTable),
            other => Err(AppError::UnsupportedPartySize(other)),
        }
    }
}

#[derive(Clone)]
pub struct AllocationService {
    ledger: Arc<dyn SeatPeriodLedger>,
    cache: Arc<dyn AvailabilityCache>,
}

impl AllocationService {
    pub fn new(ledger: Arc<dyn SeatPeriodLedger>, cache: Arc<dyn AvailabilityCache>) -> Self {
        Self { ledger, cache }
    }

    // Aloca mesa(s) para o grupo no período pedido. A leitura das candidatas
    // acontece fora da transação; a re-checagem otimista dentro dela garante
    // que duas alocações concorrentes nunca levam a mesma linha do ledger.
    pub async fn allocate(
        &self,
        party_size: i32,
        reservation_type: ReservationType,
        concrete_period_id: Uuid,
        options: serde_json::Value,
    ) -> Result<AllocationResult, AppError> {
        let plan = SeatPlan::for_party_size(party_size)?;

        self.ledger
            .find_concrete_period(concrete_period_id)
            .await?
            .ok_or(AppError::PeriodNotFound)?;

        // 1. Candidatas livres do período, já filtradas pelo canal.
        let candidates = self
            .ledger
            .free_candidates(concrete_period_id, reservation_type.is_online())
            .await?;

        // 2. Casa o formato do grupo com as candidatas. A primeira que servir
        // leva; escolha deliberada de simplicidade, sem ranking de mesa.
        let chosen = Self::choose_seats(plan, &candidates).ok_or(AppError::NoSuitableSeat)?;

        // 3. Transação: flip de cada linha + criação da reserva, tudo ou nada.
        let mut uow = self.ledger.begin().await?;
        for candidate in &chosen {
            if !uow.claim_seat_period(candidate.seat_period_id).await? {
                // Alguém commitou primeiro entre a nossa leitura e o flip.
                uow.rollback().await?;
                tracing::info!(
                    "Conflito de alocação no período {}: mesa {}{} já levada",
                    concrete_period_id,
                    candidate.prefix,
                    candidate.no
                );
                return Err(AppError::ConcurrentConflict);
            }
        }

        let reservation = uow
            .insert_reservation(&NewReservation { party_size, reservation_type, options })
            .await?;
        for candidate in &chosen {
            uow.attach_seat_period(reservation.id, candidate.seat_period_id).await?;
        }
        uow.commit().await?;

        tracing::info!(
            "Reserva {} criada: {} pessoa(s) em {} mesa(s) no período {}",
            reservation.id,
            party_size,
            chosen.len(),
            concrete_period_id
        );

        // 4. O snapshot agregado ficou velho; derruba tudo.
        self.invalidate_availability().await;

        let seats = chosen
            .into_iter()
            .map(|c| AllocatedSeat {
                seat_id: c.seat_id,
                seat_period_id: c.seat_period_id,
                prefix: c.prefix,
                no: c.no,
                capacity: c.capacity,
            })
            .collect();

        Ok(AllocationResult { reservation, seats })
    }

    // Cancela a reserva e devolve as linhas do ledger, na mesma disciplina
    // transacional da alocação. O carimbo `cancelled_at` faz papel de CAS:
    // dois cancelamentos concorrentes, só um passa.
    pub async fn cancel(&self, reservation_id: Uuid) -> Result<ReservationLog, AppError> {
        let reservation = self
            .ledger
            .find_reservation(reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)?;
        if reservation.cancelled_at.is_some() {
            return Err(AppError::ReservationAlreadyCancelled);
        }

        let seat_period_ids = self.ledger.reservation_seat_period_ids(reservation_id).await?;

        let mut uow = self.ledger.begin().await?;
        if !uow.mark_cancelled(reservation_id).await? {
            uow.rollback().await?;
            return Err(AppError::ReservationAlreadyCancelled);
        }
        for seat_period_id in &seat_period_ids {
            uow.release_seat_period(*seat_period_id).await?;
        }
        uow.commit().await?;

        tracing::info!(
            "Reserva {} cancelada; {} mesa(s) liberada(s)",
            reservation_id,
            seat_period_ids.len()
        );

        self.invalidate_availability().await;

        self.ledger
            .find_reservation(reservation_id)
            .await?
            .ok_or(AppError::ReservationNotFound)
    }

    fn choose_seats(
        plan: SeatPlan,
        candidates: &[SeatPeriodCandidate],
    ) -> Option<Vec<SeatPeriodCandidate>> {
        match plan {
            SeatPlan::SingleDouble => candidates
                .iter()
                .find(|c| c.capacity == 2)
                .map(|c| vec![c.clone()]),

            SeatPlan::LargeTable => candidates
                .iter()
                .find(|c| c.capacity == 10)
                .map(|c| vec![c.clone()]),

            // Mesa de 2 com vizinha declarada cuja linha do MESMO período
            // também está entre as candidatas livres.
            SeatPlan::SiblingPair => {
                for candidate in candidates.iter().filter(|c| c.capacity == 2) {
                    for sibling_id in &candidate.sibling_seat_ids {
                        if let Some(partner) = candidates
                            .iter()
                            .find(|p| p.seat_id == *sibling_id && p.capacity == 2)
                        {
                            return Some(vec![candidate.clone(), partner.clone()]);
                        }
                    }
                }
                None
            }
        }
    }

    // Falha de cache nunca falha a alocação: o snapshot é derivado e expira
    // sozinho pelo TTL; só registramos a degradação.
    async fn invalidate_availability(&self) {
        if let Err(e) = self.cache.delete_by_pattern(AVAILABILITY_KEY_PATTERN).await {
            tracing::warn!("Falha ao invalidar o cache de disponibilidade: {}", e);
        }
    }
}
