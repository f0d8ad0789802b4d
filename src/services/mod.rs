pub mod allocation_service;
pub use allocation_service::AllocationService;
pub mod availability_service;
pub use availability_service::AvailabilityService;
pub mod period_service;
pub use period_service::PeriodService;
pub mod seating_service;
pub use seating_service::SeatingService;
pub mod reservation_service;
pub use reservation_service::ReservationService;
pub mod auth;
pub use auth::AuthService;
