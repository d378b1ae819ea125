//! Tests for the Iyzico HTTP client against a local stub server.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use payment::signature::authorization_header;
use payment::{CancelRequest, IyzicoClient, IyzicoConfig, PaymentError, PaymentGateway};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Stub {
    /// Raw bodies received, by path.
    received: Arc<Mutex<Vec<(String, String)>>>,
}

fn config(base_url: &str) -> IyzicoConfig {
    IyzicoConfig::new("stub-key", "stub-secret", true).with_base_url(base_url)
}

/// Verifies the signature the way the gateway does.
fn check_signature(headers: &HeaderMap, uri: &str, body: &str) -> bool {
    let Some(random) = headers.get("x-iyzi-rnd").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let expected = authorization_header(&config("http://unused"), random, uri, body);
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

async fn initialize(State(stub): State<Stub>, headers: HeaderMap, body: String) -> (StatusCode, Json<Value>) {
    stub.received
        .lock()
        .unwrap()
        .push(("initialize".into(), body.clone()));
    if !check_signature(&headers, "/payment/iyzipos/checkoutform/initialize", &body) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "failure", "errorMessage": "bad signature"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "token": "tok-123",
            "checkoutFormContent": "<script></script>",
            "tokenExpireTime": 1800
        })),
    )
}

async fn retrieve(headers: HeaderMap, body: String) -> Json<Value> {
    assert!(check_signature(
        &headers,
        "/payment/iyzipos/checkoutform/auth/ecom/detail",
        &body
    ));
    let request: Value = serde_json::from_str(&body).unwrap();
    let paid = request["token"] == "tok-paid";
    Json(json!({
        "status": "success",
        "paymentStatus": if paid { "SUCCESS" } else { "FAILURE" },
        "paymentId": "9001"
    }))
}

async fn cancel() -> Json<Value> {
    Json(json!({"status": "failure", "errorCode": "5092", "errorMessage": "Payment not found"}))
}

async fn connection_test(headers: HeaderMap) -> Json<Value> {
    let ok = check_signature(&headers, "/payment/test", "{}");
    Json(json!({"status": if ok { "success" } else { "failure" }}))
}

async fn spawn_stub() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/payment/iyzipos/checkoutform/initialize", post(initialize))
        .route("/payment/iyzipos/checkoutform/auth/ecom/detail", post(retrieve))
        .route("/payment/cancel", post(cancel))
        .route("/payment/test", get(connection_test))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

fn checkout_request() -> payment::CheckoutFormRequest {
    serde_json::from_value(json!({
        "locale": "tr",
        "conversationId": "order-1",
        "price": "10.00",
        "paidPrice": "10.00",
        "currency": "TRY",
        "basketId": "order-1",
        "paymentGroup": "PRODUCT",
        "callbackUrl": "http://shop.test/checkout/result",
        "enabledInstallments": [1, 2, 3, 6, 9],
        "buyer": {
            "id": "u-1", "name": "Cem", "surname": "Kaya", "gsmNumber": "+905555555555",
            "email": "cem@example.com", "identityNumber": "11111111111",
            "registrationAddress": "Moda", "ip": "85.34.78.112",
            "city": "Istanbul", "country": "Turkey"
        },
        "shippingAddress": {"contactName": "Cem Kaya", "city": "Istanbul", "country": "Turkey", "address": "Moda"},
        "billingAddress": {"contactName": "Cem Kaya", "city": "Istanbul", "country": "Turkey", "address": "Moda"},
        "basketItems": [
            {"id": "i-1", "name": "Simit", "category1": "Food", "itemType": "PHYSICAL", "price": "10.00"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn initialize_sends_signed_camel_case_body() {
    let (base_url, stub) = spawn_stub().await;
    let client = IyzicoClient::new();

    let response = client
        .initialize_checkout(&config(&base_url), &checkout_request())
        .await
        .unwrap();
    assert_eq!(response.token, "tok-123");
    assert_eq!(response.other["tokenExpireTime"], 1800);

    let received = stub.received.lock().unwrap().clone();
    let body: Value = serde_json::from_str(&received[0].1).unwrap();
    assert_eq!(body["conversationId"], "order-1");
    assert_eq!(body["basketItems"][0]["itemType"], "PHYSICAL");
}

#[tokio::test]
async fn retrieve_reports_payment_status() {
    let (base_url, _) = spawn_stub().await;
    let client = IyzicoClient::new();

    let paid = client
        .retrieve_checkout(&config(&base_url), "tok-paid")
        .await
        .unwrap();
    assert!(paid.is_paid());

    let failed = client
        .retrieve_checkout(&config(&base_url), "tok-other")
        .await
        .unwrap();
    assert!(!failed.is_paid());
}

#[tokio::test]
async fn non_success_status_is_gateway_error() {
    let (base_url, _) = spawn_stub().await;
    let err = IyzicoClient::new()
        .cancel(&config(&base_url), &CancelRequest::new("1", "1.2.3.4", None))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Gateway(ref m) if m == "Payment not found"));
}

#[tokio::test]
async fn connection_test_checks_credentials() {
    let (base_url, _) = spawn_stub().await;
    let client = IyzicoClient::new();
    assert!(client.test_connection(&config(&base_url)).await);

    let wrong = IyzicoConfig::new("stub-key", "wrong-secret", true).with_base_url(&base_url);
    assert!(!client.test_connection(&wrong).await);
}

#[tokio::test]
async fn unreachable_gateway_fails_connection_test() {
    let client = IyzicoClient::new();
    assert!(
        !client
            .test_connection(&config("http://127.0.0.1:9"))
            .await
    );
}
