//! Payment gateway trait, the Iyzico HTTP client and an in-memory double.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::IyzicoConfig;
use crate::error::{PaymentError, Result};
use crate::signature::{authorization_header, random_string};
use crate::types::{
    CancelRequest, CheckoutFormInitialized, CheckoutFormRequest, CheckoutFormResult,
    RefundRequest,
};

pub const INITIALIZE_URI: &str = "/payment/iyzipos/checkoutform/initialize";
pub const RETRIEVE_URI: &str = "/payment/iyzipos/checkoutform/auth/ecom/detail";
pub const CANCEL_URI: &str = "/payment/cancel";
pub const REFUND_URI: &str = "/payment/refund";
pub const TEST_URI: &str = "/payment/test";

const CLIENT_VERSION: &str = "iyzico-node-client-1.0.0";

/// Operations against the payment gateway. The config is passed per call
/// because credentials live in the settings row and may change at runtime.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Starts a hosted checkout form and returns its token.
    async fn initialize_checkout(
        &self,
        config: &IyzicoConfig,
        request: &CheckoutFormRequest,
    ) -> Result<CheckoutFormInitialized>;

    /// Fetches the authoritative outcome for a checkout token.
    async fn retrieve_checkout(&self, config: &IyzicoConfig, token: &str) -> Result<CheckoutFormResult>;

    async fn cancel(&self, config: &IyzicoConfig, request: &CancelRequest) -> Result<Value>;

    async fn refund(&self, config: &IyzicoConfig, request: &RefundRequest) -> Result<Value>;

    /// Returns true when the credentials are accepted. Never fails.
    async fn test_connection(&self, config: &IyzicoConfig) -> bool;
}

/// Iyzico REST client.
#[derive(Debug, Clone, Default)]
pub struct IyzicoClient {
    http: reqwest::Client,
}

impl IyzicoClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sends a signed request and decodes a successful response.
    ///
    /// GET requests send no body but are signed over `{}`.
    async fn send<B, T>(&self, config: &IyzicoConfig, method: Method, uri: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let payload = match body {
            Some(body) => serde_json::to_string(body)?,
            None => "{}".to_string(),
        };
        let random = random_string();
        let authorization = authorization_header(config, &random, uri, &payload);

        let mut request = self
            .http
            .request(method.clone(), format!("{}{uri}", config.base_url))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-iyzi-rnd", random)
            .header("x-iyzi-client-version", CLIENT_VERSION);
        if method != Method::GET {
            request = request.body(payload);
        }

        let response = request.send().await?;
        let http_status = response.status();
        let data: Value = response.json().await.map_err(|e| {
            PaymentError::InvalidResponse(format!("HTTP {http_status}: {e}"))
        })?;

        if data.get("status").and_then(Value::as_str) != Some("success") {
            let message = data
                .get("errorMessage")
                .and_then(Value::as_str)
                .unwrap_or("Iyzico request failed")
                .to_string();
            tracing::warn!(uri, %http_status, error = %message, "gateway rejected request");
            return Err(PaymentError::Gateway(message));
        }

        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl PaymentGateway for IyzicoClient {
    #[tracing::instrument(skip(self, request), fields(conversation_id = %request.conversation_id))]
    async fn initialize_checkout(
        &self,
        config: &IyzicoConfig,
        request: &CheckoutFormRequest,
    ) -> Result<CheckoutFormInitialized> {
        self.send(config, Method::POST, INITIALIZE_URI, Some(request))
            .await
    }

    #[tracing::instrument(skip(self, token))]
    async fn retrieve_checkout(&self, config: &IyzicoConfig, token: &str) -> Result<CheckoutFormResult> {
        self.send(
            config,
            Method::POST,
            RETRIEVE_URI,
            Some(&serde_json::json!({ "token": token })),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, config: &IyzicoConfig, request: &CancelRequest) -> Result<Value> {
        self.send(config, Method::POST, CANCEL_URI, Some(request)).await
    }

    #[tracing::instrument(skip(self))]
    async fn refund(&self, config: &IyzicoConfig, request: &RefundRequest) -> Result<Value> {
        self.send(config, Method::POST, REFUND_URI, Some(request)).await
    }

    #[tracing::instrument(skip(self))]
    async fn test_connection(&self, config: &IyzicoConfig) -> bool {
        match self
            .send::<Value, Value>(config, Method::GET, TEST_URI, None)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "iyzico connection test failed");
                false
            }
        }
    }
}

/// A call received by [`InMemoryPaymentGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Initialize(CheckoutFormRequest),
    Retrieve { token: String },
    Cancel(CancelRequest),
    Refund(RefundRequest),
    Test,
}

#[derive(Debug)]
struct InMemoryGatewayState {
    calls: Vec<GatewayCall>,
    next_token: u32,
    payment_status: String,
    fail_with: Option<String>,
    connection_ok: bool,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            next_token: 0,
            payment_status: "SUCCESS".to_string(),
            fail_with: None,
            connection_ok: true,
        }
    }
}

/// In-memory gateway for testing. Records every call and answers with
/// scripted outcomes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, InMemoryGatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the `paymentStatus` returned by later retrieve calls.
    pub fn set_payment_status(&self, status: impl Into<String>) {
        self.state().payment_status = status.into();
    }

    /// Makes every later call fail with a gateway error carrying `message`.
    pub fn set_fail_with(&self, message: Option<&str>) {
        self.state().fail_with = message.map(str::to_string);
    }

    pub fn set_connection_ok(&self, ok: bool) {
        self.state().connection_ok = ok;
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().calls.clone()
    }

    /// Number of retrieve calls received so far.
    pub fn retrieve_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, GatewayCall::Retrieve { .. }))
            .count()
    }

    fn record(&self, call: GatewayCall) -> Result<()> {
        let mut state = self.state();
        state.calls.push(call);
        match &state.fail_with {
            Some(message) => Err(PaymentError::Gateway(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn initialize_checkout(
        &self,
        _config: &IyzicoConfig,
        request: &CheckoutFormRequest,
    ) -> Result<CheckoutFormInitialized> {
        self.record(GatewayCall::Initialize(request.clone()))?;
        let mut state = self.state();
        state.next_token += 1;
        let token = format!("TOKEN-{:04}", state.next_token);
        Ok(CheckoutFormInitialized {
            checkout_form_content: Some(format!("<script data-token=\"{token}\"></script>")),
            payment_page_url: None,
            token,
            other: serde_json::Map::new(),
        })
    }

    async fn retrieve_checkout(&self, _config: &IyzicoConfig, token: &str) -> Result<CheckoutFormResult> {
        self.record(GatewayCall::Retrieve {
            token: token.to_string(),
        })?;
        let status = self.state().payment_status.clone();
        let paid = status == "SUCCESS";
        Ok(CheckoutFormResult {
            payment_status: Some(status),
            payment_id: paid.then(|| format!("PAY-{token}")),
            error_message: (!paid).then(|| "Card declined".to_string()),
            other: serde_json::Map::new(),
        })
    }

    async fn cancel(&self, _config: &IyzicoConfig, request: &CancelRequest) -> Result<Value> {
        self.record(GatewayCall::Cancel(request.clone()))?;
        Ok(serde_json::json!({ "status": "success", "paymentId": request.payment_id }))
    }

    async fn refund(&self, _config: &IyzicoConfig, request: &RefundRequest) -> Result<Value> {
        self.record(GatewayCall::Refund(request.clone()))?;
        Ok(serde_json::json!({
            "status": "success",
            "paymentTransactionId": request.payment_transaction_id,
            "price": request.price,
        }))
    }

    async fn test_connection(&self, _config: &IyzicoConfig) -> bool {
        let mut state = self.state();
        state.calls.push(GatewayCall::Test);
        state.connection_ok
    }
}
