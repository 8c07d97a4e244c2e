//! Application State

use std::sync::Arc;

use logiflow_payments::PaymentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment request lifecycle
    pub payments: PaymentService,

    /// Admin bearer token (optional - listing disabled if None)
    pub admin_token: Option<Arc<str>>,
}
