pub mod appresult;
pub mod config;
pub mod health;
pub mod rooms;

use axum::{Router, extract::FromRef, http::Method, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use rooms::Relay;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            relay: Relay::new(config.max_history, &config.mail_room),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST]);

    Router::new()
        .route("/health", get(health::health))
        .merge(rooms::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
