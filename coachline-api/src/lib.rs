use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod reservations;
pub mod state;
pub mod tickets;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/tickets/{pnr}", get(tickets::get_ticket))
        .route("/v1/tickets/{pnr}/email", post(tickets::email_ticket))
        .route(
            "/v1/reservations",
            post(reservations::create_reservation).get(reservations::list_reservations),
        )
        .route(
            "/v1/reservations/{reference}",
            get(reservations::get_reservation),
        )
        .route(
            "/v1/reservations/{reference}/pay",
            post(reservations::pay_reservation),
        )
        .route(
            "/v1/reservations/{reference}/cancel",
            post(reservations::cancel_reservation),
        )
        .route(
            "/v1/reservations/{reference}/print",
            post(reservations::print_reservation),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
