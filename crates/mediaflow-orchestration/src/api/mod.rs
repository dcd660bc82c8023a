//! Thin Axum HTTP/WebSocket surface over the orchestration core (spec
//! §6.1). Handlers only validate, dispatch, and shape a response — all
//! the actual work happens through [`crate::service_registry::AppServices`].

pub mod dto;
pub mod routes;
pub mod state;
pub mod ws;

pub use routes::build_router;
pub use state::AppState;
