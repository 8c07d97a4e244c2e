//! Router Assembly

use std::path::Path;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{
    approve_payment, bank_webhook, contact, create_checkout, create_payment, get_payment,
    health_check, list_payments, payment_webhook, quote_liquid, quote_solid, upload_proof,
};
use crate::state::AppState;

/// Largest accepted request body (proof uploads)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Build the application router
///
/// Unmatched paths fall through to the static site in `static_dir`.
pub fn router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))

        // Payment requests
        .route(
            "/api/payment-requests",
            get(list_payments).post(create_payment),
        )
        .route("/api/payment-requests/{reference}", get(get_payment))
        .route(
            "/api/payment-requests/{reference}/approve",
            post(approve_payment),
        )
        .route(
            "/api/payment-requests/{reference}/checkout",
            post(create_checkout),
        )

        // Settlement
        .route("/api/payment-webhook", post(payment_webhook))
        .route("/api/proof-upload", post(upload_proof))
        .route("/api/bank-webhook", post(bank_webhook))

        // Calculator & contact
        .route("/api/quotes/solid", post(quote_solid))
        .route("/api/quotes/liquid", post(quote_liquid))
        .route("/api/contact", post(contact))

        // Static marketing site
        .fallback_service(ServeDir::new(static_dir))

        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
