//! Stored entities and the write payloads the store accepts.
//!
//! Records serialize in camelCase because the admin screens consume them
//! directly. Amounts are [`Money`]: minor units in memory, decimal lira in JSON.

use chrono::{DateTime, Utc};
use common::{EntityId, Money};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = StoreError;

    /// Parses a role name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" => Ok(Role::Customer),
            other => Err(StoreError::InvalidData(format!("unknown role '{other}'"))),
        }
    }
}

/// Lifecycle status of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Processing ──► Completed
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, waiting for payment.
    #[default]
    Pending,
    /// Payment confirmed, kitchen is preparing the order.
    Processing,
    /// Delivered to the customer.
    Completed,
    /// Payment failed or the order was called off.
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Returns true if the order may move from this status to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(StoreError::InvalidData(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

// -- Categories --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub show_icon: bool,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub parent_id: Option<EntityId>,
    pub is_indexed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable category fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryData {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub show_icon: bool,
    pub meta_title: Option<String>,
    pub meta_desc: Option<String>,
    pub parent_id: Option<EntityId>,
    pub is_indexed: bool,
}

/// Short reference to a category embedded in product responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: EntityId,
    pub name: String,
}

// -- Extras --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extra {
    pub id: EntityId,
    pub name: String,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraData {
    pub name: String,
    pub price: Money,
}

/// An extra together with the products it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraDetail {
    #[serde(flatten)]
    pub extra: Extra,
    pub products: Vec<ProductRef>,
}

// -- Variations --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationOption {
    pub id: EntityId,
    pub variation_id: EntityId,
    pub name: String,
    /// Price delta added on top of the product's base price.
    pub price: Money,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationWithOptions {
    #[serde(flatten)]
    pub variation: Variation,
    pub options: Vec<VariationOption>,
}

impl VariationWithOptions {
    /// Returns the option flagged as default, falling back to the first one.
    pub fn default_option(&self) -> Option<&VariationOption> {
        self.options
            .iter()
            .find(|o| o.is_default)
            .or_else(|| self.options.first())
    }
}

/// A variation with its options and the products that use it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationDetail {
    #[serde(flatten)]
    pub variation: Variation,
    pub options: Vec<VariationOption>,
    pub products: Vec<ProductRef>,
}

/// Writable option fields. An option with an `id` updates that stored option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionData {
    pub id: Option<EntityId>,
    pub name: String,
    pub price: Money,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariationData {
    pub name: String,
    pub description: Option<String>,
    pub options: Vec<OptionData>,
}

/// Variation name and option count shown in product listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationSummary {
    pub id: EntityId,
    pub name: String,
    pub option_count: i64,
}

// -- Products --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Unit price for single-price products; zero in variation mode.
    pub price: Money,
    /// Starting price for variation-priced products; zero otherwise.
    pub base_price: Money,
    pub category_id: EntityId,
    pub has_stock: bool,
    pub stock_quantity: i32,
    pub image: String,
    pub ingredients: Vec<String>,
    pub meta_title: String,
    pub meta_desc: String,
    pub no_index: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable product fields plus its join rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductData {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub base_price: Money,
    pub category_id: EntityId,
    pub has_stock: bool,
    pub stock_quantity: i32,
    pub image: String,
    pub ingredients: Vec<String>,
    pub meta_title: String,
    pub meta_desc: String,
    pub no_index: bool,
    /// `None` leaves the current extra links untouched.
    pub extra_ids: Option<Vec<EntityId>>,
    /// Always replaces the variation links; empty means a single-price product.
    pub variation_ids: Vec<EntityId>,
}

/// Short reference to a product embedded in extra and variation responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: EntityId,
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<CategoryRef>,
    pub has_variations: bool,
    pub in_stock: bool,
    pub variations: Vec<VariationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<CategoryRef>,
    pub has_variations: bool,
    pub in_stock: bool,
    pub extras: Vec<Extra>,
    pub variations: Vec<VariationWithOptions>,
}

// -- Users --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// -- Orders --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: EntityId,
    pub user_id: EntityId,
    pub status: OrderStatus,
    pub total: Money,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Gateway-issued checkout token.
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: EntityId,
    pub order_id: EntityId,
    /// Cleared when the product is deleted; the name stays for history.
    pub product_id: Option<EntityId>,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price including selected options and extras.
    pub price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: EntityId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: EntityId,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.price.multiply(i.quantity)).sum()
    }
}

// -- Settings --

/// Site-wide configuration, stored as a single row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub site_name: String,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub google_login_key: Option<String>,
    pub iyzico_key: Option<String>,
    pub iyzico_secret_key: Option<String>,
    pub iyzico_sandbox_mode: bool,
    pub paytr_key: Option<String>,
    pub paytr_salt: Option<String>,
    pub paytr_merchant_id: Option<String>,
    pub sms_api_key: Option<String>,
    pub sms_api_secret: Option<String>,
    pub sms_api_sender: Option<String>,
    pub navbar_color: String,
    pub footer_color: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub google_analytics_id: Option<String>,
    pub google_console_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            site_name: "RestoranX".to_string(),
            logo: None,
            favicon: None,
            email: None,
            phone: None,
            address: None,
            meta_title: None,
            meta_description: None,
            google_login_key: None,
            iyzico_key: None,
            iyzico_secret_key: None,
            iyzico_sandbox_mode: false,
            paytr_key: None,
            paytr_salt: None,
            paytr_merchant_id: None,
            sms_api_key: None,
            sms_api_secret: None,
            sms_api_sender: None,
            navbar_color: "#ffffff".to_string(),
            footer_color: "#f8f9fa".to_string(),
            primary_color: "#3b82f6".to_string(),
            secondary_color: "#6b7280".to_string(),
            google_analytics_id: None,
            google_console_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_ignores_case() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Customer ".parse::<Role>().unwrap(), Role::Customer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn order_status_roundtrips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn pending_moves_to_processing_or_cancelled() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn terminal_statuses_allow_nothing() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: EntityId::new(),
            name: "Ayse".into(),
            email: "ayse@example.com".into(),
            password_hash: "secret-hash".into(),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "CUSTOMER");
    }

    #[test]
    fn default_option_prefers_flagged_option() {
        let variation_id = EntityId::new();
        let option = |name: &str, is_default| VariationOption {
            id: EntityId::new(),
            variation_id,
            name: name.into(),
            price: Money::zero(),
            is_default,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut v = VariationWithOptions {
            variation: Variation {
                id: variation_id,
                name: "Size".into(),
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            options: vec![option("Small", false), option("Large", true)],
        };
        assert_eq!(v.default_option().unwrap().name, "Large");

        v.options[1].is_default = false;
        assert_eq!(v.default_option().unwrap().name, "Small");
    }

    #[test]
    fn new_order_total_sums_lines() {
        let order = NewOrder {
            user_id: EntityId::new(),
            address: None,
            phone: None,
            items: vec![
                NewOrderItem {
                    product_id: EntityId::new(),
                    product_name: "Lahmacun".into(),
                    quantity: 2,
                    price: Money::from_cents(9000),
                },
                NewOrderItem {
                    product_id: EntityId::new(),
                    product_name: "Ayran".into(),
                    quantity: 1,
                    price: Money::from_cents(2500),
                },
            ],
        };
        assert_eq!(order.total(), Money::from_cents(20500));
    }
}
