//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod cache;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Rotas públicas de reserva: cliente anônimo entra como canal online;
    // um token de funcionário muda a classificação do canal.
    let booking_routes = Router::new()
        .route("/api/reservations", post(handlers::reservations::create_reservation))
        .route("/api/availability", get(handlers::availability::get_availability))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            optional_auth_middleware,
        ));

    // Rotas de salão/recepção (exigem funcionário)
    let reservation_routes = Router::new()
        .route("/api/reservations", get(handlers::reservations::list_reservations))
        .route("/api/reservations/{id}", get(handlers::reservations::get_reservation))
        .route("/api/reservations/{id}/cancel", post(handlers::reservations::cancel_reservation))
        .route("/api/reservations/{id}/seated", post(handlers::reservations::mark_seated))
        .route("/api/reservations/{id}/departed", post(handlers::reservations::mark_departed))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Administração da topologia do salão
    let seating_routes = Router::new()
        .route("/seats"
               ,post(handlers::seating::create_seat)
               .get(handlers::seating::list_seats)
        )
        .route("/seats/{id}/siblings"
               ,post(handlers::seating::link_sibling)
               .get(handlers::seating::list_siblings)
        )
        .route("/seat-periods/{id}"
               ,patch(handlers::seating::update_seat_period)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Catálogo de períodos e materialização
    let period_routes = Router::new()
        .route("/"
               ,post(handlers::periods::create_period)
               .get(handlers::periods::list_periods)
        )
        .route("/{id}/occurrences"
               ,get(handlers::periods::list_concrete_periods)
        )
        .route("/{id}/materialize"
               ,post(handlers::periods::materialize_periods)
        )
        .route("/occurrences/{id}/seat-periods"
               ,get(handlers::seating::list_seat_periods)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes.merge(me_routes))
        .nest("/api", seating_routes)
        .nest("/api/periods", period_routes)
        .merge(booking_routes)
        .merge(reservation_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
