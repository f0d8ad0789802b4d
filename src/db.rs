pub mod ledger;
pub mod catalog;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
pub mod period_repo;
pub use period_repo::PeriodRepository;
pub mod seating_repo;
pub use seating_repo::SeatingRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod reservation_repo;
pub use reservation_repo::ReservationRepository;

#[cfg(test)]
pub mod memory;
