//! Iyzico request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LOCALE_TR: &str = "tr";
pub const CURRENCY_TRY: &str = "TRY";
pub const PAYMENT_GROUP_PRODUCT: &str = "PRODUCT";
pub const ITEM_TYPE_PHYSICAL: &str = "PHYSICAL";
pub const PAYMENT_STATUS_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buyer {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub gsm_number: String,
    pub email: String,
    pub identity_number: String,
    pub registration_address: String,
    pub ip: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub contact_name: String,
    pub city: String,
    pub country: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketItem {
    pub id: String,
    pub name: String,
    pub category1: String,
    pub item_type: String,
    /// Line amount as `units.cents`.
    pub price: String,
}

/// Body of `POST /payment/iyzipos/checkoutform/initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormRequest {
    pub locale: String,
    pub conversation_id: String,
    pub price: String,
    pub paid_price: String,
    pub currency: String,
    pub basket_id: String,
    pub payment_group: String,
    pub callback_url: String,
    pub enabled_installments: Vec<u32>,
    pub buyer: Buyer,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub basket_items: Vec<BasketItem>,
}

/// Successful initialize response. Fields we do not read are kept so the
/// response can be handed to the client unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormInitialized {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_form_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_page_url: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Result of `POST /payment/iyzipos/checkoutform/auth/ecom/detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormResult {
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl CheckoutFormResult {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some(PAYMENT_STATUS_SUCCESS)
    }
}

/// Body of `POST /payment/cancel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub payment_id: String,
    pub ip: String,
    pub description: String,
}

impl CancelRequest {
    pub fn new(payment_id: impl Into<String>, ip: impl Into<String>, description: Option<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            ip: ip.into(),
            description: description.unwrap_or_else(|| "Order cancelled".to_string()),
        }
    }
}

/// Body of `POST /payment/refund`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_transaction_id: String,
    pub price: String,
    pub ip: String,
    pub description: String,
}

impl RefundRequest {
    pub fn new(
        payment_transaction_id: impl Into<String>,
        price: String,
        ip: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            payment_transaction_id: payment_transaction_id.into(),
            price,
            ip: ip.into(),
            description: description.unwrap_or_else(|| "Order refunded".to_string()),
        }
    }
}
