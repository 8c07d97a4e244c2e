//! Shared test fixtures

use rust_decimal_macros::dec;

use crate::model::NewPaymentRequest;

pub fn sample_input() -> NewPaymentRequest {
    NewPaymentRequest {
        first_name: "Thandi".into(),
        last_name: "Nkosi".into(),
        email: "thandi@example.com".into(),
        phone: "+27 82 555 0101".into(),
        id_number: "9001015009087".into(),
        amount: dec!(100),
        method: "card".into(),
    }
}

/// Minimal Stripe event body wrapping a checkout session
pub fn checkout_event(event_type: &str, reference: Option<&str>) -> String {
    let metadata = reference.map_or_else(
        || serde_json::json!({}),
        |reference| serde_json::json!({ "reference": reference, "idNumber": "42" }),
    );
    serde_json::json!({
        "id": "evt_test_1",
        "object": "event",
        "api_version": "2023-10-16",
        "created": 1_760_000_000,
        "livemode": false,
        "pending_webhooks": 1,
        "request": null,
        "type": event_type,
        "data": {
            "object": {
                "id": "cs_test_1",
                "object": "checkout.session",
                "automatic_tax": { "enabled": false },
                "created": 1_760_000_000,
                "custom_fields": [],
                "custom_text": {},
                "expires_at": 1_760_086_400,
                "livemode": false,
                "metadata": metadata,
                "mode": "payment",
                "payment_method_types": ["card"],
                "payment_status": "paid",
                "shipping_options": []
            }
        }
    })
    .to_string()
}
