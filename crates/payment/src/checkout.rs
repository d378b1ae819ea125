//! Checkout lifecycle: starting a hosted payment form for an order and
//! resolving the gateway callback into an order status.

use std::sync::Arc;

use common::{EntityId, Money};
use domain::{OrderService, SettingsService};
use serde_json::Value;
use store::{OrderDetail, OrderStatus, Store};

use crate::config::IyzicoConfig;
use crate::error::{PaymentError, Result};
use crate::gateway::PaymentGateway;
use crate::types::{
    Address, BasketItem, Buyer, CancelRequest, CheckoutFormInitialized, CheckoutFormRequest,
    CURRENCY_TRY, ITEM_TYPE_PHYSICAL, LOCALE_TR, PAYMENT_GROUP_PRODUCT, RefundRequest,
};

/// Payment method recorded on orders paid through Iyzico.
pub const PAYMENT_METHOD_IYZICO: &str = "IYZICO";

/// Used when the request carries no client address.
pub const FALLBACK_CLIENT_IP: &str = "85.34.78.112";

const INSTALLMENTS: [u32; 5] = [1, 2, 3, 6, 9];
const BASKET_CATEGORY: &str = "Food";
const DEFAULT_CITY: &str = "Istanbul";
const DEFAULT_COUNTRY: &str = "Turkey";
const DEFAULT_GSM: &str = "+905555555555";
const DEFAULT_IDENTITY_NUMBER: &str = "11111111111";
const DEFAULT_ADDRESS: &str = "No address provided";
const DEFAULT_FIRST_NAME: &str = "İsimsiz";
const DEFAULT_SURNAME: &str = "Kullanıcı";

/// How a gateway callback was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The order is paid and moved to processing.
    Paid { order_id: EntityId },
    /// The payment failed or could not be resolved.
    Failed {
        order_id: Option<EntityId>,
        reason: String,
    },
}

impl CallbackOutcome {
    fn label(&self) -> &'static str {
        match self {
            CallbackOutcome::Paid { .. } => "paid",
            CallbackOutcome::Failed { order_id: Some(_), .. } => "failed",
            CallbackOutcome::Failed { order_id: None, .. } => "unresolved",
        }
    }

    /// Storefront page the customer is sent to.
    pub fn redirect_url(&self, app_url: &str) -> String {
        let base = app_url.trim_end_matches('/');
        let (path, params) = match self {
            CallbackOutcome::Paid { order_id } => {
                ("success", vec![("orderId", order_id.to_string())])
            }
            CallbackOutcome::Failed { order_id, reason } => {
                let mut params = Vec::new();
                if let Some(id) = order_id {
                    params.push(("orderId", id.to_string()));
                }
                params.push(("error", reason.clone()));
                ("error", params)
            }
        };
        let page = format!("{base}/checkout/{path}");
        match reqwest::Url::parse_with_params(&page, &params) {
            Ok(url) => url.to_string(),
            Err(_) => page,
        }
    }
}

/// Drives Iyzico checkouts for stored orders.
pub struct CheckoutService<S: Store> {
    orders: OrderService<S>,
    settings: SettingsService<S>,
    gateway: Arc<dyn PaymentGateway>,
    app_url: String,
}

impl<S: Store + Clone> CheckoutService<S> {
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>, app_url: impl Into<String>) -> Self {
        Self {
            orders: OrderService::new(store.clone()),
            settings: SettingsService::new(store),
            gateway,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl<S: Store> CheckoutService<S> {
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    async fn config(&self) -> Result<IyzicoConfig> {
        let settings = self.settings.get().await?;
        IyzicoConfig::from_settings(&settings)
    }

    /// Opens a checkout form for `order_id` and records the returned token on
    /// the order.
    #[tracing::instrument(skip(self, callback_url))]
    pub async fn initiate(
        &self,
        order_id: EntityId,
        callback_url: Option<String>,
        client_ip: Option<&str>,
    ) -> Result<CheckoutFormInitialized> {
        let order = self.orders.get_order(order_id).await?;
        let config = self.config().await?;

        let callback_url = callback_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("{}/checkout/result", self.app_url));
        let request = build_checkout_request(&order, callback_url, client_ip)?;

        let response = self.gateway.initialize_checkout(&config, &request).await?;
        self.orders
            .attach_payment(order.order.id, &response.token, PAYMENT_METHOD_IYZICO)
            .await?;

        metrics::counter!("checkout_initiated_total").increment(1);
        tracing::info!(order_id = %order.order.id, total = %order.order.total, "checkout initiated");
        Ok(response)
    }

    /// Resolves a gateway callback token.
    ///
    /// An order that already left `Pending` is answered from its stored
    /// status without asking the gateway again. Gateway and configuration
    /// failures leave the order untouched.
    #[tracing::instrument(skip(self, token))]
    pub async fn handle_callback(&self, token: &str) -> CallbackOutcome {
        let outcome = match self.resolve_callback(token).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "payment callback could not be resolved");
                CallbackOutcome::Failed {
                    order_id: None,
                    reason: e.to_string(),
                }
            }
        };
        metrics::counter!("payment_callbacks_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn resolve_callback(&self, token: &str) -> Result<CallbackOutcome> {
        let Some(order) = self
            .orders
            .find_by_payment(token, PAYMENT_METHOD_IYZICO)
            .await?
        else {
            return Ok(CallbackOutcome::Failed {
                order_id: None,
                reason: "Order not found".to_string(),
            });
        };

        if order.status != OrderStatus::Pending {
            tracing::info!(order_id = %order.id, status = %order.status, "callback replay");
            return Ok(settled_outcome(order.id, order.status));
        }

        let failed = |reason: String| CallbackOutcome::Failed {
            order_id: Some(order.id),
            reason,
        };

        let config = match self.config().await {
            Ok(config) => config,
            Err(e) => return Ok(failed(e.to_string())),
        };
        let result = match self.gateway.retrieve_checkout(&config, token).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "payment lookup failed");
                return Ok(failed(e.to_string()));
            }
        };

        let target = if result.is_paid() {
            OrderStatus::Processing
        } else {
            OrderStatus::Cancelled
        };
        if !self
            .orders
            .transition(order.id, OrderStatus::Pending, target)
            .await?
        {
            // A concurrent delivery got there first; report what it stored.
            let current = self.orders.get_order(order.id).await?;
            return Ok(settled_outcome(order.id, current.order.status));
        }

        Ok(if result.is_paid() {
            CallbackOutcome::Paid { order_id: order.id }
        } else {
            failed(
                result
                    .error_message
                    .unwrap_or_else(|| "Payment failed".to_string()),
            )
        })
    }

    /// Cancels a captured payment.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, payment_id: &str, ip: Option<&str>, description: Option<String>) -> Result<Value> {
        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(PaymentError::validation("Payment id is required"));
        }
        let config = self.config().await?;
        let request = CancelRequest::new(payment_id, ip.unwrap_or(FALLBACK_CLIENT_IP), description);
        let response = self.gateway.cancel(&config, &request).await?;
        tracing::info!(payment_id, "payment cancelled");
        Ok(response)
    }

    /// Refunds `amount` of a payment transaction.
    #[tracing::instrument(skip(self))]
    pub async fn refund(
        &self,
        transaction_id: &str,
        amount: Money,
        ip: Option<&str>,
        description: Option<String>,
    ) -> Result<Value> {
        let transaction_id = transaction_id.trim();
        if transaction_id.is_empty() {
            return Err(PaymentError::validation("Payment transaction id is required"));
        }
        if !amount.is_positive() {
            return Err(PaymentError::validation("Refund amount must be greater than zero"));
        }
        let config = self.config().await?;
        let request = RefundRequest::new(
            transaction_id,
            amount.to_decimal_string(),
            ip.unwrap_or(FALLBACK_CLIENT_IP),
            description,
        );
        let response = self.gateway.refund(&config, &request).await?;
        tracing::info!(transaction_id, %amount, "payment refunded");
        Ok(response)
    }

    /// Checks credentials against the gateway before they are saved.
    #[tracing::instrument(skip(self))]
    pub async fn test_connection(&self, config: &IyzicoConfig) -> bool {
        self.gateway.test_connection(config).await
    }
}

fn settled_outcome(order_id: EntityId, status: OrderStatus) -> CallbackOutcome {
    match status {
        OrderStatus::Processing | OrderStatus::Completed => CallbackOutcome::Paid { order_id },
        OrderStatus::Cancelled | OrderStatus::Pending => CallbackOutcome::Failed {
            order_id: Some(order_id),
            reason: "Payment failed".to_string(),
        },
    }
}

/// Splits a full name into first name and surname.
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string());
    let rest = parts.collect::<Vec<_>>().join(" ");
    let surname = if rest.is_empty() {
        DEFAULT_SURNAME.to_string()
    } else {
        rest
    };
    (first, surname)
}

/// Builds the initialize request for a stored order.
pub fn build_checkout_request(
    order: &OrderDetail,
    callback_url: String,
    client_ip: Option<&str>,
) -> Result<CheckoutFormRequest> {
    let user = order
        .user
        .as_ref()
        .ok_or_else(|| PaymentError::validation("Order has no customer"))?;
    if order.items.is_empty() {
        return Err(PaymentError::validation("Order has no items"));
    }

    let ip = client_ip
        .and_then(|ip| ip.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string();
    let address = order
        .order
        .address
        .clone()
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let contact_name = if user.name.trim().is_empty() {
        format!("{DEFAULT_FIRST_NAME} {DEFAULT_SURNAME}")
    } else {
        user.name.trim().to_string()
    };
    let (name, surname) = split_name(&user.name);
    let order_id = order.order.id.to_string();
    let total = order.order.total.to_decimal_string();

    let party_address = Address {
        contact_name,
        city: DEFAULT_CITY.to_string(),
        country: DEFAULT_COUNTRY.to_string(),
        address: address.clone(),
    };

    Ok(CheckoutFormRequest {
        locale: LOCALE_TR.to_string(),
        conversation_id: order_id.clone(),
        price: total.clone(),
        paid_price: total,
        currency: CURRENCY_TRY.to_string(),
        basket_id: order_id,
        payment_group: PAYMENT_GROUP_PRODUCT.to_string(),
        callback_url,
        enabled_installments: INSTALLMENTS.to_vec(),
        buyer: Buyer {
            id: user.id.to_string(),
            name,
            surname,
            gsm_number: order
                .order
                .phone
                .clone()
                .unwrap_or_else(|| DEFAULT_GSM.to_string()),
            email: user.email.clone(),
            identity_number: DEFAULT_IDENTITY_NUMBER.to_string(),
            registration_address: address,
            ip,
            city: DEFAULT_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        },
        shipping_address: party_address.clone(),
        billing_address: party_address,
        basket_items: order
            .items
            .iter()
            .map(|item| BasketItem {
                id: item.id.to_string(),
                name: item.product_name.clone(),
                category1: BASKET_CATEGORY.to_string(),
                item_type: ITEM_TYPE_PHYSICAL.to_string(),
                price: item.line_total().to_decimal_string(),
            })
            .collect(),
    })
}
