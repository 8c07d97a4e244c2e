//! LogiFlow HTTP Server
//!
//! Axum-based server for payment request intake, admin approval, Stripe
//! checkout, settlement notifications and the shipping calculator.

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logiflow_payments::{
    JsonFilePaymentStore, LocalProofStorage, PaymentService, RedirectUrls, StripeCheckout,
    WebhookVerifier,
};

use crate::config::Config;
use crate::routes::router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Storage
    let store = Arc::new(JsonFilePaymentStore::new(&config.data_path));
    let proofs = Arc::new(LocalProofStorage::new(&config.proof_dir));
    tracing::info!(
        data = %config.data_path.display(),
        proofs = %config.proof_dir.display(),
        "Storage ready"
    );

    let redirects = RedirectUrls::parse(&config.success_url, &config.cancel_url)?;
    let mut payments = PaymentService::new(store, proofs, redirects);

    // Stripe
    match config.stripe_secret_key.as_deref() {
        Some(key) => {
            let checkout = StripeCheckout::new(key, config.checkout_currency);
            tracing::info!(currency = ?checkout.currency(), "✓ Stripe checkout configured");
            payments = payments.with_checkout(Arc::new(checkout));
        }
        None => {
            tracing::warn!("⚠ Stripe not configured - checkout disabled");
            tracing::warn!("  Set STRIPE_SECRET_KEY in .env");
        }
    }
    match config.stripe_webhook_secret.as_deref() {
        Some(secret) => {
            tracing::info!("✓ Webhook signature verification enabled");
            payments = payments.with_webhook_verifier(WebhookVerifier::new(secret));
        }
        None => {
            tracing::warn!("⚠ STRIPE_WEBHOOK_SECRET not set - webhook events are dropped");
        }
    }

    if config.admin_token.is_none() {
        tracing::warn!("⚠ ADMIN_TOKEN not set - payment listing disabled");
    }

    // Build application state
    let state = AppState {
        payments,
        admin_token: config.admin_token.as_deref().map(Arc::from),
    };

    let app = router(state, &config.static_dir);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚚 LogiFlow server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                - Health check");
    tracing::info!("  GET  /api/payment-requests                  - List requests (admin)");
    tracing::info!("  POST /api/payment-requests                  - Create request");
    tracing::info!("  GET  /api/payment-requests/{{ref}}            - Request status");
    tracing::info!("  POST /api/payment-requests/{{ref}}/approve    - Admin approval");
    tracing::info!("  POST /api/payment-requests/{{ref}}/checkout   - Stripe checkout");
    tracing::info!("  POST /api/payment-webhook                   - Stripe webhook");
    tracing::info!("  POST /api/proof-upload                      - Proof of payment");
    tracing::info!("  POST /api/bank-webhook                      - Bank notification");
    tracing::info!("  POST /api/quotes/{{solid,liquid}}             - Shipping quote");
    tracing::info!("  POST /api/contact                           - Contact form");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
