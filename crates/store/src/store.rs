use async_trait::async_trait;
use common::EntityId;

use crate::Result;
use crate::model::{
    Category, CategoryData, Extra, ExtraData, ExtraDetail, NewOrder, NewUser, Order, OrderDetail,
    OrderStatus, ProductData, ProductDetail, ProductSummary, Settings, User, VariationData,
    VariationDetail, VariationWithOptions,
};

/// Category persistence.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Lists all categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn get_category(&self, id: EntityId) -> Result<Option<Category>>;

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Inserts a category. A taken slug fails with `UniqueViolation`.
    async fn insert_category(&self, data: CategoryData) -> Result<Category>;

    /// Replaces the writable fields. Returns `None` if the category is missing.
    async fn update_category(&self, id: EntityId, data: CategoryData)
    -> Result<Option<Category>>;

    /// Deletes a category row. Returns false if nothing was deleted.
    async fn delete_category(&self, id: EntityId) -> Result<bool>;

    async fn count_child_categories(&self, id: EntityId) -> Result<i64>;

    async fn count_category_products(&self, id: EntityId) -> Result<i64>;
}

/// Product persistence, including the product/extra and product/variation joins.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Lists all products, newest first.
    async fn list_products(&self) -> Result<Vec<ProductSummary>>;

    async fn get_product(&self, id: EntityId) -> Result<Option<ProductDetail>>;

    async fn insert_product(&self, data: ProductData) -> Result<ProductDetail>;

    /// Updates a product and replaces its join rows.
    async fn update_product(&self, id: EntityId, data: ProductData)
    -> Result<Option<ProductDetail>>;

    /// Deletes a product and its join rows. Order items keep their product name.
    async fn delete_product(&self, id: EntityId) -> Result<bool>;
}

/// Extra persistence.
#[async_trait]
pub trait ExtraStore: Send + Sync {
    /// Lists all extras, newest first.
    async fn list_extras(&self) -> Result<Vec<Extra>>;

    async fn get_extra(&self, id: EntityId) -> Result<Option<ExtraDetail>>;

    async fn insert_extra(&self, data: ExtraData) -> Result<Extra>;

    async fn update_extra(&self, id: EntityId, data: ExtraData) -> Result<Option<Extra>>;

    /// Clears the product links, then deletes the extra.
    async fn delete_extra(&self, id: EntityId) -> Result<bool>;
}

/// Variation and variation option persistence.
#[async_trait]
pub trait VariationStore: Send + Sync {
    /// Lists all variations with their options, newest first.
    async fn list_variations(&self) -> Result<Vec<VariationWithOptions>>;

    async fn get_variation(&self, id: EntityId) -> Result<Option<VariationDetail>>;

    async fn insert_variation(&self, data: VariationData) -> Result<VariationWithOptions>;

    /// Updates the variation and diffs its options: options with an id are
    /// updated, options without one are created, stored options missing from
    /// `data` are deleted.
    async fn update_variation(
        &self,
        id: EntityId,
        data: VariationData,
    ) -> Result<Option<VariationWithOptions>>;

    /// Removes product links and options, then the variation.
    async fn delete_variation(&self, id: EntityId) -> Result<bool>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a pending order with its items.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetail>;

    /// Loads an order with its items and owning user.
    async fn get_order(&self, id: EntityId) -> Result<Option<OrderDetail>>;

    /// Finds the order a gateway token was issued for.
    async fn find_order_by_payment(&self, payment_id: &str, method: &str)
    -> Result<Option<Order>>;

    /// Records the gateway token and payment method on an order.
    async fn set_order_payment(&self, id: EntityId, payment_id: &str, method: &str)
    -> Result<bool>;

    /// Moves an order from `from` to `to`. Writes nothing and returns false
    /// when the stored status is not `from`.
    async fn transition_order_status(
        &self,
        id: EntityId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool>;
}

/// User account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A taken email fails with `UniqueViolation`.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: EntityId) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

/// Singleton settings persistence.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the settings row, creating it with defaults on first use.
    ///
    /// Concurrent first calls converge on a single row.
    async fn get_or_create_settings(&self) -> Result<Settings>;

    /// Overwrites the settings row, creating it if needed.
    async fn save_settings(&self, settings: &Settings) -> Result<Settings>;
}

/// The full persistence surface used by the services.
pub trait Store:
    CategoryStore + ProductStore + ExtraStore + VariationStore + OrderStore + UserStore + SettingsStore
{
}

impl<T> Store for T where
    T: CategoryStore
        + ProductStore
        + ExtraStore
        + VariationStore
        + OrderStore
        + UserStore
        + SettingsStore
{
}
