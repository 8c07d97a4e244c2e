//! Domain Models
//!
//! Payment requests, their references and the status lifecycle.
//! Amounts are `rust_decimal::Decimal`, serialized as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// Payment reference (formatted: REF-<idNumber>-XXXXXX)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    const PREFIX: &'static str = "REF-";
    const SUFFIX_LEN: usize = 6;

    /// Generate a reference for a customer id number
    ///
    /// The suffix comes from a v4 UUID, which draws on the OS random source.
    /// Uniqueness is likely, not guaranteed; the store rejects duplicates.
    pub fn generate(id_number: &str) -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!(
            "{}{}-{}",
            Self::PREFIX,
            id_number,
            &hex[..Self::SUFFIX_LEN]
        ))
    }

    /// Wrap an existing reference string as received from a client
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Check the `REF-<id>-XXXXXX` shape
    pub fn is_well_formed(&self) -> bool {
        let Some(rest) = self.0.strip_prefix(Self::PREFIX) else {
            return false;
        };
        let Some((id, suffix)) = rest.rsplit_once('-') else {
            return false;
        };
        !id.is_empty()
            && suffix.len() == Self::SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round to cents, half away from zero
pub(crate) fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Amount in minor units, or `None` if it does not fit an `i64`
pub(crate) fn minor_units(amount: Decimal) -> Option<i64> {
    round_to_cents(amount).checked_mul(dec!(100))?.to_i64()
}

/// Lifecycle state of a payment request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Waiting for an admin to approve
    PendingAdmin,
    /// Approved, may proceed to checkout
    Approved,
    /// Settled through checkout or bank notification
    Paid,
}

/// Events that move a payment request through its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    Approve,
    CheckoutCompleted,
    BankSettled,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingAdmin => "pending_admin",
            Self::Approved => "approved",
            Self::Paid => "paid",
        }
    }

    /// Next state for `event`, or `Conflict` if the transition is not allowed
    pub fn apply(self, event: StatusEvent) -> Result<Self> {
        match (self, event) {
            (Self::PendingAdmin | Self::Approved, StatusEvent::Approve) => Ok(Self::Approved),
            (Self::Approved | Self::Paid, StatusEvent::CheckoutCompleted)
            | (_, StatusEvent::BankSettled) => Ok(Self::Paid),
            (Self::Paid, StatusEvent::Approve) => {
                Err(PaymentError::Conflict("Payment already settled".into()))
            }
            (Self::PendingAdmin, StatusEvent::CheckoutCompleted) => {
                Err(PaymentError::Conflict("Not approved by admin".into()))
            }
        }
    }

    /// Whether a checkout session may be opened
    pub const fn can_checkout(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted payment request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub reference: Reference,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub method: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    /// Handle of the uploaded proof-of-payment file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl PaymentRequest {
    /// Create a pending request with a fresh reference
    pub fn new(input: NewPaymentRequest) -> Self {
        Self {
            reference: Reference::generate(&input.id_number),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            id_number: input.id_number,
            amount: input.amount,
            method: input.method,
            status: PaymentStatus::PendingAdmin,
            created_at: Utc::now(),
            approved_at: None,
            paid_at: None,
            proof: None,
        }
    }

    /// Apply a lifecycle event, stamping the matching timestamp
    ///
    /// Re-approval re-stamps `approved_at`; a repeated settlement keeps the
    /// original `paid_at`.
    pub fn transition(&mut self, event: StatusEvent, now: DateTime<Utc>) -> Result<()> {
        let next = self.status.apply(event)?;
        match event {
            StatusEvent::Approve => self.approved_at = Some(now),
            StatusEvent::CheckoutCompleted | StatusEvent::BankSettled => {
                if self.status != PaymentStatus::Paid {
                    self.paid_at = Some(now);
                }
            }
        }
        self.status = next;
        Ok(())
    }

    /// Public status projection (no contact details)
    pub fn status_view(&self) -> PaymentStatusView {
        PaymentStatusView {
            reference: self.reference.clone(),
            status: self.status,
            amount: self.amount,
            method: self.method.clone(),
            id_number: self.id_number.clone(),
        }
    }
}

/// Status lookup response
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusView {
    pub reference: Reference,
    pub status: PaymentStatus,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    pub method: String,
    pub id_number: String,
}

/// Creation payload as received from a client; every field may be absent
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub id_number: Option<String>,
    /// Accepts a JSON number or a numeric string
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub method: Option<String>,
}

/// Validated creation input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPaymentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub id_number: String,
    pub amount: Decimal,
    pub method: String,
}

impl CreatePaymentRequest {
    /// Check that all seven fields are present and usable
    pub fn validate(self) -> Result<NewPaymentRequest> {
        let mut missing = Vec::new();
        let mut take = |name: &'static str, value: Option<String>| {
            let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
            if value.is_empty() {
                missing.push(name);
            }
            value
        };

        let first_name = take("firstName", self.first_name);
        let last_name = take("lastName", self.last_name);
        let email = take("email", self.email);
        let phone = take("phone", self.phone);
        let id_number = take("idNumber", self.id_number);
        let method = take("method", self.method);

        if self.amount.is_none() {
            missing.push("amount");
        }
        if !missing.is_empty() {
            return Err(PaymentError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let amount = self
            .amount
            .filter(|amount| *amount > Decimal::ZERO)
            .ok_or_else(|| PaymentError::Validation("Amount must be positive".into()))?;
        if minor_units(amount).is_none() {
            return Err(PaymentError::Validation("Amount out of range".into()));
        }

        Ok(NewPaymentRequest {
            first_name,
            last_name,
            email,
            phone,
            id_number,
            amount,
            method,
        })
    }
}
