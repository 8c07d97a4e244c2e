//! Stripe Checkout Integration
//!
//! Hosted checkout: the customer is redirected to Stripe's payment page and
//! comes back to the success or cancel URL. Completion is reported through the
//! webhook (see [`crate::webhook`]).

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, Currency,
};

use crate::error::{PaymentError, Result};

/// Request to open a hosted checkout session for one payment request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Payment reference, echoed back in webhook metadata
    pub reference: String,

    /// Customer id number, stored as metadata
    pub id_number: String,

    /// Customer email
    pub customer_email: String,

    /// Line item name
    pub product_name: String,

    /// Amount in the currency's minor unit
    pub unit_amount: i64,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session ID
    pub id: String,

    /// URL to redirect user to
    pub checkout_url: String,
}

/// A hosted checkout provider
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a session, returning the URL the customer should visit
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
}

/// Parse a currency code such as `zar` or `USD`
pub fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_str(&code.trim().to_lowercase())
        .map_err(|_| PaymentError::Config(format!("Unknown currency: {code}")))
}

/// Stripe client wrapper
pub struct StripeCheckout {
    client: Client,
    currency: Currency,
}

impl StripeCheckout {
    /// Create a new Stripe checkout provider charging in `currency`
    pub fn new(secret_key: &str, currency: Currency) -> Self {
        Self {
            client: Client::new(secret_key),
            currency,
        }
    }

    pub const fn currency(&self) -> Currency {
        self.currency
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.customer_email = Some(&request.customer_email);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);

        let mut metadata = HashMap::new();
        metadata.insert("reference".to_string(), request.reference.clone());
        metadata.insert("idNumber".to_string(), request.id_number.clone());
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: self.currency,
                unit_amount: Some(request.unit_amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: request.product_name.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = StripeCheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let checkout_url = session
            .url
            .ok_or_else(|| PaymentError::Provider("No checkout URL returned".into()))?;

        tracing::info!(
            reference = %request.reference,
            session_id = %session.id,
            "Created Stripe checkout session"
        );

        Ok(CheckoutSession {
            id: session.id.to_string(),
            checkout_url,
        })
    }
}
