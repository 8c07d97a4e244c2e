//! Payment Lifecycle
//!
//! Every operation on a payment request: creation, lookup, admin approval,
//! checkout hand-off, proof upload and the two settlement paths (checkout
//! webhook and bank notification).
//!
//! ```text
//! pending_admin ──approve──▶ approved ──checkout webhook──▶ paid
//!       │                        │                           ▲
//!       └────────────── bank notification (amount match) ────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::checkout::{CheckoutProvider, CheckoutRequest, CheckoutSession};
use crate::error::{PaymentError, Result};
use crate::model::{
    CreatePaymentRequest, PaymentRequest, PaymentStatus, PaymentStatusView, Reference,
    StatusEvent, minor_units, round_to_cents,
};
use crate::proof::ProofStorage;
use crate::store::PaymentStore;
use crate::webhook::{WebhookEvent, WebhookVerifier};

/// Attempts at drawing an unused reference before giving up
const REFERENCE_ATTEMPTS: usize = 5;

/// Where the hosted checkout page sends the customer back to
#[derive(Clone, Debug)]
pub struct RedirectUrls {
    pub success: Url,
    pub cancel: Url,
}

impl RedirectUrls {
    pub fn parse(success: &str, cancel: &str) -> Result<Self> {
        let parse = |name: &str, raw: &str| {
            Url::parse(raw)
                .map_err(|e| PaymentError::Config(format!("Invalid {name} URL {raw}: {e}")))
        };
        Ok(Self {
            success: parse("success", success)?,
            cancel: parse("cancel", cancel)?,
        })
    }

    fn with_reference(url: &Url, reference: &Reference) -> String {
        let mut url = url.clone();
        url.query_pairs_mut().append_pair("reference", reference.as_str());
        url.to_string()
    }
}

/// Short acknowledgement returned by creation and approval
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentAck {
    pub reference: Reference,
    pub status: PaymentStatus,
}

impl From<&PaymentRequest> for PaymentAck {
    fn from(request: &PaymentRequest) -> Self {
        Self {
            reference: request.reference.clone(),
            status: request.status,
        }
    }
}

/// What happened to a checkout webhook delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No webhook secret configured; the delivery was not inspected
    Unverified,
    /// The referenced request is now paid
    MarkedPaid(Reference),
    /// Event referenced an unknown request
    UnknownReference(Reference),
    /// Event was valid but did not apply (other type, no reference, bad state)
    Ignored(String),
}

/// Bank notification payload
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct BankNotification {
    #[serde(default)]
    pub reference: Option<String>,
    /// Accepts a JSON number or a numeric string
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Payment lifecycle service
#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    proofs: Arc<dyn ProofStorage>,
    checkout: Option<Arc<dyn CheckoutProvider>>,
    webhook: Option<Arc<WebhookVerifier>>,
    redirects: RedirectUrls,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        proofs: Arc<dyn ProofStorage>,
        redirects: RedirectUrls,
    ) -> Self {
        Self {
            store,
            proofs,
            checkout: None,
            webhook: None,
            redirects,
        }
    }

    /// Enable checkout sessions
    #[must_use]
    pub fn with_checkout(mut self, provider: Arc<dyn CheckoutProvider>) -> Self {
        self.checkout = Some(provider);
        self
    }

    /// Enable webhook signature verification
    #[must_use]
    pub fn with_webhook_verifier(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook = Some(Arc::new(verifier));
        self
    }

    pub const fn checkout_configured(&self) -> bool {
        self.checkout.is_some()
    }

    pub const fn webhook_verified(&self) -> bool {
        self.webhook.is_some()
    }

    fn require(&self, reference: &Reference) -> Result<PaymentRequest> {
        self.store
            .get(reference)?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))
    }

    fn transition(&self, reference: &Reference, event: StatusEvent) -> Result<PaymentRequest> {
        let now = Utc::now();
        self.store
            .update(reference, &mut |request: &mut PaymentRequest| request.transition(event, now))?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))
    }

    /// Record a new payment request awaiting admin approval
    pub fn create(&self, payload: CreatePaymentRequest) -> Result<PaymentAck> {
        let input = payload.validate()?;

        for _ in 0..REFERENCE_ATTEMPTS {
            let request = PaymentRequest::new(input.clone());
            let ack = PaymentAck::from(&request);
            match self.store.insert(request) {
                Ok(()) => {
                    tracing::info!(
                        reference = %ack.reference,
                        amount = %input.amount,
                        method = %input.method,
                        "Created payment request"
                    );
                    return Ok(ack);
                }
                Err(PaymentError::Conflict(_)) => {
                    tracing::warn!(reference = %ack.reference, "Reference collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(PaymentError::Storage(
            "Could not allocate a unique reference".into(),
        ))
    }

    /// Every stored request, unfiltered
    pub fn list(&self) -> Result<Vec<PaymentRequest>> {
        self.store.list()
    }

    /// Status projection for one request
    pub fn status(&self, reference: &Reference) -> Result<PaymentStatusView> {
        Ok(self.require(reference)?.status_view())
    }

    /// Admin approval; re-approving re-stamps `approved_at`
    pub fn approve(&self, reference: &Reference) -> Result<PaymentAck> {
        let request = self.transition(reference, StatusEvent::Approve)?;
        tracing::info!(reference = %reference, "Approved payment request");
        Ok(PaymentAck::from(&request))
    }

    /// Open a hosted checkout session for an approved request
    pub async fn create_checkout_session(&self, reference: &Reference) -> Result<CheckoutSession> {
        let request = self.require(reference)?;
        if !request.status.can_checkout() {
            return Err(PaymentError::Conflict("Not approved by admin".into()));
        }
        let provider = self.checkout.as_ref().ok_or_else(|| {
            PaymentError::Unavailable("Stripe not configured. Set STRIPE_SECRET_KEY env.".into())
        })?;

        let unit_amount = minor_units(request.amount)
            .ok_or_else(|| PaymentError::Validation("Amount out of range".into()))?;

        provider
            .create_session(CheckoutRequest {
                reference: request.reference.to_string(),
                id_number: request.id_number.clone(),
                customer_email: request.email.clone(),
                product_name: format!("Logistics Service ({})", request.reference),
                unit_amount,
                success_url: RedirectUrls::with_reference(&self.redirects.success, reference),
                cancel_url: RedirectUrls::with_reference(&self.redirects.cancel, reference),
            })
            .await
    }

    /// Process a checkout provider webhook delivery
    ///
    /// Signature and parse failures are errors; everything else is an
    /// acknowledged outcome so the provider stops redelivering.
    pub fn handle_checkout_webhook(
        &self,
        payload: &str,
        signature: Option<&str>,
    ) -> Result<WebhookOutcome> {
        let Some(verifier) = self.webhook.as_ref() else {
            tracing::warn!("Webhook secret not configured, dropping unverified event");
            return Ok(WebhookOutcome::Unverified);
        };

        let signature = signature
            .ok_or_else(|| PaymentError::Signature("Missing Stripe signature".into()))?;
        let event = verifier.construct_event(payload, signature)?;

        tracing::info!(event = ?event, "Processing Stripe webhook");

        let reference = match event {
            WebhookEvent::CheckoutCompleted { reference } => reference,
            WebhookEvent::CheckoutWithoutReference { session_id } => {
                tracing::warn!(session_id = %session_id, "Completed checkout without reference");
                return Ok(WebhookOutcome::Ignored("missing reference".into()));
            }
            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
                return Ok(WebhookOutcome::Ignored(event_type));
            }
        };

        match self.transition(&reference, StatusEvent::CheckoutCompleted) {
            Ok(_) => {
                tracing::info!(reference = %reference, "Payment settled via checkout");
                Ok(WebhookOutcome::MarkedPaid(reference))
            }
            Err(PaymentError::NotFound(_)) => {
                tracing::warn!(reference = %reference, "Checkout completed for unknown reference");
                Ok(WebhookOutcome::UnknownReference(reference))
            }
            Err(PaymentError::Conflict(reason)) => {
                tracing::warn!(
                    reference = %reference,
                    reason = %reason,
                    "Checkout completion rejected"
                );
                Ok(WebhookOutcome::Ignored(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Attach an uploaded proof of payment; an earlier proof is replaced
    pub fn upload_proof(
        &self,
        reference: Option<&str>,
        file_name: Option<&str>,
        bytes: Option<&[u8]>,
    ) -> Result<()> {
        let (Some(reference), Some(bytes)) = (
            reference.map(str::trim).filter(|r| !r.is_empty()),
            bytes.filter(|b| !b.is_empty()),
        ) else {
            return Err(PaymentError::Validation("Reference and proof required".into()));
        };
        let reference = Reference::from_string(reference);

        let existing = self.require(&reference)?;
        if let Some(previous) = existing.proof.as_deref() {
            tracing::info!(
                reference = %reference,
                previous = %previous,
                "Replacing proof of payment"
            );
        }

        let handle = self.proofs.store(file_name, bytes)?;
        self.store
            .update(&reference, &mut |request: &mut PaymentRequest| {
                request.proof = Some(handle.clone());
                Ok(())
            })?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))?;

        Ok(())
    }

    /// Settle a request from a bank notification
    ///
    /// The amount must equal the stored amount to the cent.
    pub fn bank_notification(&self, notification: BankNotification) -> Result<PaymentAck> {
        let reference = notification
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .map(Reference::from_string)
            .ok_or_else(|| PaymentError::Validation("Reference required".into()))?;
        let amount = notification.amount.map(round_to_cents);

        let now = Utc::now();
        let request = self
            .store
            .update(&reference, &mut |request: &mut PaymentRequest| {
                if amount != Some(round_to_cents(request.amount)) {
                    return Err(PaymentError::AmountMismatch);
                }
                request.transition(StatusEvent::BankSettled, now)
            })?
            .ok_or_else(|| PaymentError::NotFound(reference.to_string()))?;

        tracing::info!(reference = %reference, "Payment settled via bank notification");
        Ok(PaymentAck::from(&request))
    }
}
