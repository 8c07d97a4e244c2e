//! # logiflow-payments
//!
//! Payment intake for LogiFlow logistics services.
//!
//! A customer submits a payment request, an admin approves it, and the
//! customer then pays either through Stripe's hosted checkout or by bank
//! transfer (confirmed by a bank notification). Proof-of-payment files can be
//! attached at any point.
//!
//! ```text
//! ┌──────────┐   create    ┌───────────────┐  approve  ┌──────────┐
//! │ Customer │───────────▶ │ pending_admin │─────────▶ │ approved │
//! └──────────┘             └───────────────┘           └──────────┘
//!                                  │                        │ checkout
//!                                  │ bank notification      ▼
//!                                  │                 ┌─────────────┐
//!                                  └───────────────▶ │    paid     │ ◀── Stripe webhook
//!                                                    └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logiflow_payments::{
//!     Currency, JsonFilePaymentStore, LocalProofStorage, PaymentService, RedirectUrls,
//!     StripeCheckout,
//! };
//!
//! let service = PaymentService::new(
//!     Arc::new(JsonFilePaymentStore::new("payments.json")),
//!     Arc::new(LocalProofStorage::new("proofs")),
//!     RedirectUrls::parse(
//!         "https://logiflow.example/success.html",
//!         "https://logiflow.example/cancel.html",
//!     )?,
//! )
//! .with_checkout(Arc::new(StripeCheckout::new("sk_test_xxx", Currency::ZAR)));
//!
//! let ack = service.create(payload)?;
//! service.approve(&ack.reference)?;
//! let session = service.create_checkout_session(&ack.reference).await?;
//! // Redirect user to: session.checkout_url
//! ```

mod checkout;
mod error;
mod model;
mod proof;
mod service;
mod store;
mod webhook;

#[cfg(test)]
mod testing;

pub use checkout::{
    CheckoutProvider, CheckoutRequest, CheckoutSession, StripeCheckout, parse_currency,
};
pub use error::{PaymentError, Result};
pub use model::{
    CreatePaymentRequest, NewPaymentRequest, PaymentRequest, PaymentStatus, PaymentStatusView,
    Reference, StatusEvent,
};
pub use proof::{LocalProofStorage, MemoryProofStorage, ProofStorage};
pub use service::{BankNotification, PaymentAck, PaymentService, RedirectUrls, WebhookOutcome};
pub use store::{JsonFilePaymentStore, MemoryPaymentStore, PaymentStore, RecordUpdate};
pub use webhook::{SIGNATURE_HEADER, WebhookEvent, WebhookVerifier, sign_payload};

pub use stripe::Currency;
