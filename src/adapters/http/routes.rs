//! Payment route table and shared handler state.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::application::{ClickGateway, PaymeGateway};

use super::handlers;

/// Shared state injected into the payment handlers.
#[derive(Clone)]
pub struct PaymentAppState {
    pub click: Arc<ClickGateway>,
    pub payme: Arc<PaymeGateway>,
}

/// Build the payment router.
pub fn payment_routes(state: PaymentAppState) -> Router {
    Router::new()
        .route("/payment/click/prepare", post(handlers::click_prepare))
        .route("/payment/click/complete", post(handlers::click_complete))
        .route("/payment/payme", post(handlers::payme))
        .route("/health", get(handlers::health))
        .with_state(state)
}
