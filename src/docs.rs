// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Seating ---
        handlers::seating::create_seat,
        handlers::seating::list_seats,
        handlers::seating::link_sibling,
        handlers::seating::list_siblings,
        handlers::seating::update_seat_period,
        handlers::seating::list_seat_periods,

        // --- Periods ---
        handlers::periods::create_period,
        handlers::periods::list_periods,
        handlers::periods::list_concrete_periods,
        handlers::periods::materialize_periods,

        // --- Reservations ---
        handlers::reservations::create_reservation,
        handlers::reservations::list_reservations,
        handlers::reservations::get_reservation,
        handlers::reservations::cancel_reservation,
        handlers::reservations::mark_seated,
        handlers::reservations::mark_departed,

        // --- Availability ---
        handlers::availability::get_availability,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Employee,
            models::auth::RegisterEmployeePayload,
            models::auth::LoginEmployeePayload,
            models::auth::AuthResponse,

            // --- Seating ---
            models::seating::Seat,
            models::seating::SeatPeriod,
            handlers::seating::CreateSeatPayload,
            handlers::seating::LinkSiblingPayload,
            handlers::seating::UpdateSeatPeriodPayload,

            // --- Periods ---
            models::periods::PeriodIntervalUnit,
            models::periods::Period,
            models::periods::ConcretePeriod,
            models::periods::MaterializationReport,
            handlers::periods::CreatePeriodPayload,
            handlers::periods::MaterializePayload,

            // --- Reservations ---
            models::reservations::ReservationType,
            models::reservations::ReservationLog,
            models::reservations::AllocatedSeat,
            models::reservations::AllocationResult,
            models::reservations::ReservationDetail,
            handlers::reservations::CreateReservationPayload,

            // --- Availability ---
            models::availability::AvailabilityGranularity,
            models::availability::PeriodAvailability,
            models::availability::DatePeriodAvailability,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação de funcionários"),
        (name = "Seating", description = "Topologia do salão (mesas, ligações e ledger)"),
        (name = "Periods", description = "Modelos de período e materialização"),
        (name = "Reservations", description = "Alocação, cancelamento e fluxos de salão"),
        (name = "Availability", description = "Capacidade agregada por dia/período")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
