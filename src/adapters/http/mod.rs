//! HTTP adapter: axum routes, handlers and wire DTOs.

mod dto;
mod handlers;
mod routes;

pub use dto::{ClickCompleteDto, ClickPrepareDto};
pub use routes::{payment_routes, PaymentAppState};
