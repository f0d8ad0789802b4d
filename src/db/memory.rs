// src/db/memory.rs
//
// Ledger em memória para os testes dos serviços: mesma semântica de
// compare-and-swap e de unidade de trabalho do LedgerRepository, sem
// precisar de um Postgres de pé. Cada método cede o executor uma vez
// (yield_now) para reproduzir os pontos de suspensão de I/O do banco real;
// é isso que deixa os testes de corrida intercalarem as duas alocações.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        catalog::PeriodCatalog,
        ledger::{LedgerUnitOfWork, SeatPeriodLedger},
    },
    models::{
        availability::PeriodAvailability,
        periods::{ConcretePeriod, Period, PeriodIntervalUnit},
        reservations::{NewReservation, ReservationLog},
        seating::SeatPeriodCandidate,
    },
};

#[derive(Debug, Clone)]
pub struct MemSeat {
    pub id: Uuid,
    pub prefix: String,
    pub no: i32,
    pub capacity: i32,
}

#[derive(Debug, Clone)]
pub struct MemSeatPeriod {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub concrete_period_id: Uuid,
    pub can_booked: bool,
    pub can_online_booked: bool,
}

#[derive(Default)]
struct MemState {
    templates: HashMap<Uuid, Period>,
    concrete_periods: HashMap<Uuid, ConcretePeriod>,
    seats: HashMap<Uuid, MemSeat>,
    siblings: HashMap<Uuid, Vec<Uuid>>,
    seat_periods: HashMap<Uuid, MemSeatPeriod>,
    reservations: HashMap<Uuid, ReservationLog>,
    links: HashMap<Uuid, Vec<Uuid>>,
}

#[derive(Clone, Default)]
pub struct MemLedger {
    state: Arc<Mutex<MemState>>,
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---
    // Montagem de cenário
    // ---

    pub fn add_seat(&self, prefix: &str, no: i32, capacity: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().seats.insert(
            id,
            MemSeat { id, prefix: prefix.to_string(), no, capacity },
        );
        id
    }

    // Ligação dirigida, igual à tabela seat_siblings.
    pub fn link_sibling(&self, seat_id: Uuid, sibling_seat_id: Uuid) {
        self.lock().siblings.entry(seat_id).or_default().push(sibling_seat_id);
    }

    pub fn add_concrete_period(&self, started_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().concrete_periods.insert(
            id,
            ConcretePeriod {
                id,
                period_id: Uuid::new_v4(),
                started_at,
                ended_at: started_at + Duration::hours(2),
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_seat_period(
        &self,
        seat_id: Uuid,
        concrete_period_id: Uuid,
        can_booked: bool,
        can_online_booked: bool,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().seat_periods.insert(
            id,
            MemSeatPeriod { id, seat_id, concrete_period_id, can_booked, can_online_booked },
        );
        id
    }

    // Escrita direta no ledger, por fora do motor. Útil para simular uma
    // mutação que não passou pela invalidação de cache.
    pub fn set_can_booked(&self, seat_period_id: Uuid, value: bool) {
        if let Some(sp) = self.lock().seat_periods.get_mut(&seat_period_id) {
            sp.can_booked = value;
        }
    }

    // ---
    // Inspeção para asserções
    // ---

    pub fn seat_period(&self, id: Uuid) -> Option<MemSeatPeriod> {
        self.lock().seat_periods.get(&id).cloned()
    }

    pub fn reservation(&self, id: Uuid) -> Option<ReservationLog> {
        self.lock().reservations.get(&id).cloned()
    }

    pub fn claimed_by(&self, seat_period_id: Uuid) -> Vec<Uuid> {
        let state = self.lock();
        state
            .links
            .iter()
            .filter(|(reservation_id, sps)| {
                sps.contains(&seat_period_id)
                    && state
                        .reservations
                        .get(reservation_id)
                        .is_some_and(|r| r.cancelled_at.is_none())
            })
            .map(|(reservation_id, _)| *reservation_id)
            .collect()
    }

    pub fn seat_period_count(&self) -> usize {
        self.lock().seat_periods.len()
    }

    pub fn concrete_period_count(&self) -> usize {
        self.lock().concrete_periods.len()
    }
}

#[async_trait]
impl SeatPeriodLedger for MemLedger {
    async fn find_concrete_period(&self, id: Uuid) -> Result<Option<ConcretePeriod>, AppError> {
        tokio::task::yield_now().await;
        Ok(self.lock().concrete_periods.get(&id).cloned())
    }

    async fn free_candidates(
        &self,
        concrete_period_id: Uuid,
        online_only: bool,
    ) -> Result<Vec<SeatPeriodCandidate>, AppError> {
        tokio::task::yield_now().await;
        let state = self.lock();
        let mut candidates: Vec<SeatPeriodCandidate> = state
            .seat_periods
            .values()
            .filter(|sp| {
                sp.concrete_period_id == concrete_period_id
                    && sp.can_booked
                    && (!online_only || sp.can_online_booked)
            })
            .filter_map(|sp| {
                let seat = state.seats.get(&sp.seat_id)?;
                Some(SeatPeriodCandidate {
                    seat_period_id: sp.id,
                    seat_id: seat.id,
                    prefix: seat.prefix.clone(),
                    no: seat.no,
                    capacity: seat.capacity,
                    sibling_seat_ids: state.siblings.get(&seat.id).cloned().unwrap_or_default(),
                })
            })
            .collect();
        candidates.sort_by(|a, b| (&a.prefix, a.no).cmp(&(&b.prefix, b.no)));
        Ok(candidates)
    }

    async fn period_loads(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        online_only: bool,
    ) -> Result<Vec<PeriodAvailability>, AppError> {
        tokio::task::yield_now().await;
        let state = self.lock();
        let mut loads: Vec<PeriodAvailability> = state
            .concrete_periods
            .values()
            .filter(|cp| cp.started_at >= from && cp.started_at < to)
            .filter_map(|cp| {
                let mut total = 0i64;
                let mut available = 0i64;
                let mut matched = false;
                for sp in state.seat_periods.values() {
                    if sp.concrete_period_id != cp.id || (online_only && !sp.can_online_booked) {
                        continue;
                    }
                    let Some(seat) = state.seats.get(&sp.seat_id) else { continue };
                    matched = true;
                    total += seat.capacity as i64;
                    if sp.can_booked {
                        available += seat.capacity as i64;
                    }
                }
                // Sem linha elegível para o canal, o período é omitido.
                matched.then(|| PeriodAvailability {
                    concrete_period_id: cp.id,
                    started_at: cp.started_at,
                    ended_at: cp.ended_at,
                    total_capacity: total,
                    available_capacity: available,
                })
            })
            .collect();
        loads.sort_by_key(|p| p.started_at);
        Ok(loads)
    }

    async fn find_reservation(&self, id: Uuid) -> Result<Option<ReservationLog>, AppError> {
        tokio::task::yield_now().await;
        Ok(self.lock().reservations.get(&id).cloned())
    }

    async fn reservation_seat_period_ids(&self, reservation_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        tokio::task::yield_now().await;
        Ok(self.lock().links.get(&reservation_id).cloned().unwrap_or_default())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, AppError> {
        tokio::task::yield_now().await;
        Ok(Box::new(MemLedgerUnitOfWork {
            state: Arc::clone(&self.state),
            undo: Vec::new(),
            done: false,
        }))
    }
}

// Operações desfeitas em ordem inversa no rollback (ou no Drop sem commit,
// espelhando o rollback implícito da transação do sqlx).
enum UndoOp {
    Claim(Uuid),
    Release { seat_period_id: Uuid, was_booked: bool },
    InsertReservation(Uuid),
    Attach { reservation_id: Uuid, seat_period_id: Uuid },
    Cancel(Uuid),
}

struct MemLedgerUnitOfWork {
    state: Arc<Mutex<MemState>>,
    undo: Vec<UndoOp>,
    done: bool,
}

impl MemLedgerUnitOfWork {
    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_undo(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for op in self.undo.drain(..).rev() {
            match op {
                UndoOp::Claim(id) => {
                    if let Some(sp) = state.seat_periods.get_mut(&id) {
                        sp.can_booked = true;
                    }
                }
                UndoOp::Release { seat_period_id, was_booked } => {
                    if let Some(sp) = state.seat_periods.get_mut(&seat_period_id) {
                        sp.can_booked = was_booked;
                    }
                }
                UndoOp::InsertReservation(id) => {
                    state.reservations.remove(&id);
                }
                UndoOp::Attach { reservation_id, seat_period_id } => {
                    if let Some(sps) = state.links.get_mut(&reservation_id) {
                        sps.retain(|sp| *sp != seat_period_id);
                    }
                }
                UndoOp::Cancel(id) => {
                    if let Some(r) = state.reservations.get_mut(&id) {
                        r.cancelled_at = None;
                    }
                }
            }
        }
    }
}

impl Drop for MemLedgerUnitOfWork {
    fn drop(&mut self) {
        if !self.done {
            self.apply_undo();
        }
    }
}

#[async_trait]
impl LedgerUnitOfWork for MemLedgerUnitOfWork {
    async fn claim_seat_period(&mut self, seat_period_id: Uuid) -> Result<bool, AppError> {
        tokio::task::yield_now().await;
        let claimed = {
            let mut state = self.lock();
            match state.seat_periods.get_mut(&seat_period_id) {
                Some(sp) if sp.can_booked => {
                    sp.can_booked = false;
                    true
                }
                _ => false,
            }
        };
        if claimed {
            self.undo.push(UndoOp::Claim(seat_period_id));
        }
        Ok(claimed)
    }

    async fn release_seat_period(&mut self, seat_period_id: Uuid) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        let was_booked = {
            let mut state = self.lock();
            match state.seat_periods.get_mut(&seat_period_id) {
                Some(sp) => {
                    let was = sp.can_booked;
                    sp.can_booked = true;
                    was
                }
                None => return Ok(()),
            }
        };
        self.undo.push(UndoOp::Release { seat_period_id, was_booked });
        Ok(())
    }

    async fn insert_reservation(&mut self, data: &NewReservation) -> Result<ReservationLog, AppError> {
        tokio::task::yield_now().await;
        let reservation = ReservationLog {
            id: Uuid::new_v4(),
            party_size: data.party_size,
            reservation_type: data.reservation_type,
            options: data.options.clone(),
            start_of_meal: None,
            end_of_meal: None,
            cancelled_at: None,
            created_at: Utc::now(),
        };
        self.lock().reservations.insert(reservation.id, reservation.clone());
        self.undo.push(UndoOp::InsertReservation(reservation.id));
        Ok(reservation)
    }

    async fn attach_seat_period(
        &mut self,
        reservation_id: Uuid,
        seat_period_id: Uuid,
    ) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        self.lock().links.entry(reservation_id).or_default().push(seat_period_id);
        self.undo.push(UndoOp::Attach { reservation_id, seat_period_id });
        Ok(())
    }

    async fn mark_cancelled(&mut self, reservation_id: Uuid) -> Result<bool, AppError> {
        tokio::task::yield_now().await;
        let cancelled = {
            let mut state = self.lock();
            match state.reservations.get_mut(&reservation_id) {
                Some(r) if r.cancelled_at.is_none() => {
                    r.cancelled_at = Some(Utc::now());
                    true
                }
                _ => false,
            }
        };
        if cancelled {
            self.undo.push(UndoOp::Cancel(reservation_id));
        }
        Ok(cancelled)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        self.done = true;
        self.undo.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), AppError> {
        tokio::task::yield_now().await;
        self.apply_undo();
        self.done = true;
        Ok(())
    }
}

#[async_trait]
impl PeriodCatalog for MemLedger {
    async fn create_template(
        &self,
        title: &str,
        interval_unit: PeriodIntervalUnit,
        interval_amount: i32,
        anchor_start: DateTime<Utc>,
        online_default: bool,
    ) -> Result<Period, AppError> {
        tokio::task::yield_now().await;
        let period = Period {
            id: Uuid::new_v4(),
            title: title.to_string(),
            interval_unit,
            interval_amount,
            anchor_start,
            online_default,
            created_at: Utc::now(),
        };
        self.lock().templates.insert(period.id, period.clone());
        Ok(period)
    }

    async fn find_template(&self, id: Uuid) -> Result<Option<Period>, AppError> {
        tokio::task::yield_now().await;
        Ok(self.lock().templates.get(&id).cloned())
    }

    async fn list_templates(&self) -> Result<Vec<Period>, AppError> {
        tokio::task::yield_now().await;
        let mut templates: Vec<Period> = self.lock().templates.values().cloned().collect();
        templates.sort_by_key(|t| t.anchor_start);
        Ok(templates)
    }

    async fn list_concrete_periods(&self, period_id: Uuid) -> Result<Vec<ConcretePeriod>, AppError> {
        tokio::task::yield_now().await;
        let mut periods: Vec<ConcretePeriod> = self
            .lock()
            .concrete_periods
            .values()
            .filter(|cp| cp.period_id == period_id)
            .cloned()
            .collect();
        periods.sort_by_key(|cp| cp.started_at);
        Ok(periods)
    }

    async fn upsert_concrete_period(
        &self,
        period_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<(Uuid, bool), AppError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        if let Some(existing) = state
            .concrete_periods
            .values()
            .find(|cp| cp.period_id == period_id && cp.started_at == started_at)
        {
            return Ok((existing.id, false));
        }
        let id = Uuid::new_v4();
        state.concrete_periods.insert(
            id,
            ConcretePeriod { id, period_id, started_at, ended_at, created_at: Utc::now() },
        );
        Ok((id, true))
    }

    async fn seed_seat_periods(
        &self,
        concrete_period_id: Uuid,
        online_default: bool,
    ) -> Result<u64, AppError> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        let seat_ids: Vec<Uuid> = state.seats.keys().copied().collect();
        let mut created = 0u64;
        for seat_id in seat_ids {
            let exists = state
                .seat_periods
                .values()
                .any(|sp| sp.seat_id == seat_id && sp.concrete_period_id == concrete_period_id);
            if !exists {
                let id = Uuid::new_v4();
                state.seat_periods.insert(
                    id,
                    MemSeatPeriod {
                        id,
                        seat_id,
                        concrete_period_id,
                        can_booked: true,
                        can_online_booked: online_default,
                    },
                );
                created += 1;
            }
        }
        Ok(created)
    }
}
