//! HTTP Handlers

use axum::{
    Json,
    extract::{
        Path, State,
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use logiflow_payments::{
    BankNotification, CreatePaymentRequest, PaymentAck, PaymentRequest, PaymentStatusView,
    Reference, SIGNATURE_HEADER,
};
use logiflow_pricing::{LiquidPackage, LiquidQuote, SolidPackage, SolidQuote};

use crate::error::{ApiError, payment_status};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checkout_configured: bool,
    pub webhook_verification: bool,
}

#[derive(Debug, Serialize)]
pub struct PaymentList {
    pub payments: Vec<PaymentRequest>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(ApiError::forbidden(
            "Listing disabled. Set ADMIN_TOKEN env.",
        ));
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        _ => {
            tracing::warn!("Rejected admin request with missing or wrong token");
            Err(ApiError::unauthorized())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        checkout_configured: state.payments.checkout_configured(),
        webhook_verification: state.payments.webhook_verified(),
    })
}

/// List every payment request (admin only)
pub async fn list_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<PaymentList> {
    require_admin(&state, &headers)?;
    Ok(Json(PaymentList {
        payments: state.payments.list()?,
    }))
}

/// Create a payment request pending admin approval
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> ApiResult<PaymentAck> {
    let Json(payload) = payload?;
    Ok(Json(state.payments.create(payload)?))
}

/// Status lookup by reference
pub async fn get_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<PaymentStatusView> {
    Ok(Json(state.payments.status(&Reference::from_string(reference))?))
}

/// Admin approval
pub async fn approve_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<PaymentAck> {
    Ok(Json(state.payments.approve(&Reference::from_string(reference))?))
}

/// Create Stripe checkout session for an approved request
pub async fn create_checkout(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> ApiResult<CheckoutResponse> {
    let session = state
        .payments
        .create_checkout_session(&Reference::from_string(reference))
        .await?;
    Ok(Json(CheckoutResponse {
        url: session.checkout_url,
    }))
}

/// Stripe webhook handler
///
/// Errors are plain text so Stripe's dashboard shows them verbatim.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.payments.handle_checkout_webhook(&body, signature) {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "Webhook acknowledged");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            let status = payment_status(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "Webhook processing error");
            } else {
                tracing::warn!(error = %e, "Webhook rejected");
            }
            (status, format!("Webhook Error: {e}")).into_response()
        }
    }
}

/// Attach a proof-of-payment upload (multipart: `reference`, `proof`)
pub async fn upload_proof(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<SuccessResponse> {
    let mut multipart = multipart?;
    let mut reference = None;
    let mut file_name = None;
    let mut bytes = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "reference" => reference = Some(field.text().await?),
            "proof" => {
                file_name = field.file_name().map(str::to_string);
                bytes = Some(field.bytes().await?);
            }
            _ => {}
        }
    }

    state
        .payments
        .upload_proof(reference.as_deref(), file_name.as_deref(), bytes.as_deref())?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Bank transfer notification
pub async fn bank_webhook(
    State(state): State<AppState>,
    payload: Result<Json<BankNotification>, JsonRejection>,
) -> ApiResult<SuccessResponse> {
    let Json(notification) = payload?;
    state.payments.bank_notification(notification)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Solid package quote
pub async fn quote_solid(
    payload: Result<Json<SolidPackage>, JsonRejection>,
) -> ApiResult<SolidQuote> {
    let Json(package) = payload?;
    Ok(Json(package.quote()?))
}

/// Liquid package quote
pub async fn quote_liquid(
    payload: Result<Json<LiquidPackage>, JsonRejection>,
) -> ApiResult<LiquidQuote> {
    let Json(package) = payload?;
    Ok(Json(package.quote()?))
}

/// Contact form submission
pub async fn contact(
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<ContactResponse> {
    let Json(request) = payload?;
    let field = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let (Some(name), Some(email), Some(message)) = (
        field(request.name),
        field(request.email),
        field(request.message),
    ) else {
        return Err(ApiError::bad_request("Please fill in all fields"));
    };

    tracing::info!(
        name = %name,
        email = %email,
        length = message.len(),
        "Contact form message received"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you for your message! We will get back to you soon.",
    }))
}

#[cfg(test)]
mod tests {
    use std::path::Path as StdPath;
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
    };
    use logiflow_payments::{
        CheckoutProvider, CheckoutRequest, CheckoutSession, MemoryPaymentStore, MemoryProofStorage,
        PaymentService, PaymentStatus, PaymentStore, RedirectUrls, WebhookVerifier, sign_payload,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::router;

    const WEBHOOK_SECRET: &str = "whsec_handlers";
    const ADMIN_TOKEN: &str = "admin-secret";

    struct FakeCheckout;

    #[async_trait::async_trait]
    impl CheckoutProvider for FakeCheckout {
        async fn create_session(
            &self,
            request: CheckoutRequest,
        ) -> logiflow_payments::Result<CheckoutSession> {
            Ok(CheckoutSession {
                id: "cs_test".into(),
                checkout_url: format!("https://checkout.test/{}", request.reference),
            })
        }
    }

    struct TestApp {
        router: Router,
        store: Arc<MemoryPaymentStore>,
        proofs: Arc<MemoryProofStorage>,
    }

    fn app() -> TestApp {
        app_with_admin(Some(ADMIN_TOKEN))
    }

    fn app_with_admin(admin_token: Option<&str>) -> TestApp {
        let store = Arc::new(MemoryPaymentStore::new());
        let proofs = Arc::new(MemoryProofStorage::new());
        let redirects = RedirectUrls::parse(
            "http://localhost:3000/success.html",
            "http://localhost:3000/cancel.html",
        )
        .unwrap();
        let payments = PaymentService::new(store.clone(), proofs.clone(), redirects)
            .with_checkout(Arc::new(FakeCheckout))
            .with_webhook_verifier(WebhookVerifier::new(WEBHOOK_SECRET));
        let state = AppState {
            payments,
            admin_token: admin_token.map(Arc::from),
        };
        TestApp {
            router: router(state, StdPath::new("does-not-exist")),
            store,
            proofs,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::post(uri).body(Body::empty()).unwrap()
    }

    fn valid_payment() -> Value {
        json!({
            "firstName": "Thandi",
            "lastName": "Nkosi",
            "email": "thandi@example.com",
            "phone": "0825550101",
            "idNumber": "9001015009087",
            "amount": 100,
            "method": "eft"
        })
    }

    async fn create(app: &TestApp) -> String {
        let request = post_json("/api/payment-requests", &valid_payment());
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        body["reference"].as_str().unwrap().to_string()
    }

    fn checkout_completed(reference: &str) -> String {
        json!({
            "id": "evt_test_1",
            "object": "event",
            "created": 1_760_000_000,
            "livemode": false,
            "pending_webhooks": 1,
            "type": "checkout.session.completed",
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
                    "metadata": { "reference": reference },
                    "mode": "payment",
                    "payment_method_types": ["card"],
                    "payment_status": "paid",
                    "shipping_options": []
                }
            }
        })
        .to_string()
    }

    fn multipart(reference: Option<&str>, file: Option<&[u8]>) -> Request<Body> {
        let boundary = "logiflow-boundary";
        let mut body = Vec::new();
        if let Some(reference) = reference {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\n\
                     Content-Disposition: form-data; name=\"reference\"\r\n\r\n\
                     {reference}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(file) = file {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\n\
                     Content-Disposition: form-data; name=\"proof\"; filename=\"slip.pdf\"\r\n\
                     Content-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Request::post("/api/proof-upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_status() {
        let app = app();
        let request = post_json("/api/payment-requests", &valid_payment());
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pending_admin");
        let reference = body["reference"].as_str().unwrap();
        assert!(reference.starts_with("REF-9001015009087-"));
        assert!(Reference::from_string(reference).is_well_formed());

        let uri = format!("/api/payment-requests/{reference}");
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reference"], reference);
        assert_eq!(body["amount"], json!(100.0));
        assert_eq!(body["method"], "eft");
        assert_eq!(body["idNumber"], "9001015009087");
        assert!(body.get("email").is_none());
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let app = app();
        for field in ["firstName", "lastName", "email", "phone", "idNumber", "amount", "method"] {
            let mut payload = valid_payment();
            payload.as_object_mut().unwrap().remove(field);
            let request = post_json("/api/payment-requests", &payload);
            let (status, body) = send(&app.router, request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "missing {field}");
            assert!(body["error"].as_str().unwrap().contains(field));
        }
        assert!(app.store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_amount_out_of_range() {
        let app = app();
        let mut payload = valid_payment();
        payload["amount"] = json!("79228162514264337593543950335");
        let (status, body) = send(&app.router, post_json("/api/payment-requests", &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Amount out of range");
        assert!(app.store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_malformed_json() {
        let app = app();
        let request = Request::post("/api/payment-requests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let app = app();
        let (status, body) = send(
            &app.router,
            Request::get("/api/payment-requests/REF-1-ABCDEF").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Payment not found");

        let request = post_empty("/api/payment-requests/REF-1-ABCDEF/approve");
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_approve_then_checkout() {
        let app = app();
        let reference = create(&app).await;

        let checkout_uri = format!("/api/payment-requests/{reference}/checkout");
        let (status, _) = send(&app.router, post_empty(&checkout_uri)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app.router,
            post_empty(&format!("/api/payment-requests/{reference}/approve")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "approved");
        let stored = app.store.get(&Reference::from_string(&reference)).unwrap().unwrap();
        assert!(stored.approved_at.is_some());

        let (status, body) = send(&app.router, post_empty(&checkout_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], format!("https://checkout.test/{reference}"));
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let app = app();
        create(&app).await;

        let (status, _) = send(
            &app.router,
            Request::get("/api/payment-requests").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        for wrong in ["admin-secreT", "admin-secre", "admin-secret2", ""] {
            let request = Request::get("/api/payment-requests")
                .header(header::AUTHORIZATION, format!("Bearer {wrong}"))
                .body(Body::empty())
                .unwrap();
            let (status, _) = send(&app.router, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "token {wrong:?}");
        }

        let request = Request::get("/api/payment-requests")
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        let payments = body["payments"].as_array().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["email"], "thandi@example.com");
    }

    #[tokio::test]
    async fn test_list_disabled_without_token() {
        let app = app_with_admin(None);
        let request = Request::get("/api/payment-requests")
            .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_checkout_webhook() {
        let app = app();
        let reference = create(&app).await;
        send(
            &app.router,
            post_empty(&format!("/api/payment-requests/{reference}/approve")),
        )
        .await;

        let payload = checkout_completed(&reference);
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let signature =
            sign_payload(WEBHOOK_SECRET, &payload, i64::try_from(now).unwrap()).unwrap();

        let forged = Request::post("/api/payment-webhook")
            .header(SIGNATURE_HEADER, signature.replace("v1=", "v1=00"))
            .body(Body::from(payload.clone()))
            .unwrap();
        let (status, body) = send(&app.router, forged).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.as_str().unwrap().starts_with("Webhook Error:"));

        let request = Request::post("/api/payment-webhook")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(payload))
            .unwrap();
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);

        let stored = app.store.get(&Reference::from_string(&reference)).unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_bank_webhook() {
        let app = app();
        let reference = create(&app).await;

        let (status, body) = send(
            &app.router,
            post_json("/api/bank-webhook", &json!({ "reference": reference, "amount": 999 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "AMOUNT_MISMATCH");
        let stored = app.store.get(&Reference::from_string(&reference)).unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::PendingAdmin);

        let (status, body) = send(
            &app.router,
            post_json("/api/bank-webhook", &json!({ "reference": reference, "amount": "100.00" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let stored = app.store.get(&Reference::from_string(&reference)).unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);

        let request = post_json("/api/bank-webhook", &json!({ "amount": 1 }));
        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            &app.router,
            post_json("/api/bank-webhook", &json!({ "reference": "REF-1-ABCDEF", "amount": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_proof_upload() {
        let app = app();
        let reference = create(&app).await;

        let request = multipart(Some(&reference), Some(b"%PDF-1.4"));
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let stored = app.store.get(&Reference::from_string(&reference)).unwrap().unwrap();
        let handle = stored.proof.unwrap();
        assert_eq!(app.proofs.get(&handle).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_proof_upload_errors() {
        let app = app();
        let (status, _) = send(&app.router, multipart(Some("REF-1-ABCDEF"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app.router, multipart(Some("REF-1-ABCDEF"), Some(b"%PDF"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(app.proofs.is_empty());
    }

    #[tokio::test]
    async fn test_quotes() {
        let app = app();
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/quotes/solid",
                &json!({
                    "weight": 10,
                    "dimensions": { "length": 10, "width": 10, "height": 10, "fragile": false },
                    "distance": "local",
                    "service": "ground"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(12.0));
        assert_eq!(body["breakdown"]["chargeableWeight"], json!(10.0));

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/quotes/liquid",
                &json!({
                    "weight": 5,
                    "volume": 1200,
                    "distance": "domestic",
                    "service": "sea",
                    "liquidType": "hazardous"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(29.25));

        let (status, _) = send(
            &app.router,
            post_json("/api/quotes/liquid", &json!({ "weight": -5, "volume": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let oversized = json!({
            "weight": 1,
            "dimensions": { "length": 1e15, "width": 1e15, "height": 1e15 }
        });
        let (status, body) = send(&app.router, post_json("/api/quotes/solid", &oversized)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_contact_form() {
        let app = app();
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/contact",
                &json!({
                    "name": "Sipho",
                    "email": "sipho@example.com",
                    "message": "Quote please"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(
            &app.router,
            post_json("/api/contact", &json!({ "name": "Sipho", "message": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please fill in all fields");
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checkoutConfigured"], true);
        assert_eq!(body["webhookVerification"], true);
    }
}
