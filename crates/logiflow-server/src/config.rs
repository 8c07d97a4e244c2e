//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded). Empty values count as
//! unset.

use std::path::PathBuf;

use anyhow::Context;
use logiflow_payments::{Currency, parse_currency};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SUCCESS_URL: &str = "http://localhost:3000/success.html";
const DEFAULT_CANCEL_URL: &str = "http://localhost:3000/cancel.html";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// JSON document holding all payment requests
    pub data_path: PathBuf,

    /// Directory for uploaded proofs of payment
    pub proof_dir: PathBuf,

    /// Static marketing site served for unmatched paths
    pub static_dir: PathBuf,

    /// Stripe secret key; checkout is disabled without it
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret; webhooks are dropped unverified without it
    pub stripe_webhook_secret: Option<String>,

    pub checkout_currency: Currency,
    pub success_url: String,
    pub cancel_url: String,

    /// Bearer token for admin endpoints; listing is disabled without it
    pub admin_token: Option<String>,
}

impl Config {
    /// Create from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let currency = or("CHECKOUT_CURRENCY", "zar");
        let checkout_currency = parse_currency(&currency)
            .with_context(|| format!("CHECKOUT_CURRENCY is not a known currency: {currency:?}"))?;

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port,
            data_path: or("DATA_PATH", "payments.json").into(),
            proof_dir: or("PROOF_DIR", "proofs").into(),
            static_dir: or("STATIC_DIR", "static").into(),
            stripe_secret_key: get("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            checkout_currency,
            success_url: or("CLIENT_SUCCESS_URL", DEFAULT_SUCCESS_URL),
            cancel_url: or("CLIENT_CANCEL_URL", DEFAULT_CANCEL_URL),
            admin_token: get("ADMIN_TOKEN"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
