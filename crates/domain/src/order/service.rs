//! Order placement and status changes.

use std::collections::HashMap;

use common::{EntityId, Money};
use serde::Deserialize;
use store::{NewOrder, NewOrderItem, Order, OrderDetail, OrderStatus, Store};

use crate::error::{DomainError, Result};
use crate::validation::{optional_text, parse_id, parse_ids};

use super::pricing::unit_price;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderLineInput {
    pub product_id: String,
    pub quantity: u32,
    pub option_ids: Vec<String>,
    pub extra_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceOrderInput {
    pub items: Vec<OrderLineInput>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Largest quantity a single order line may ask for.
pub const MAX_LINE_QUANTITY: u32 = 1000;

/// Service for placing orders and moving them through their lifecycle.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Prices the requested lines and stores a pending order for `user_id`.
    #[tracing::instrument(skip(self, input))]
    pub async fn place_order(&self, user_id: EntityId, input: PlaceOrderInput) -> Result<OrderDetail> {
        if input.items.is_empty() {
            return Err(DomainError::validation("The order has no items"));
        }

        let mut items = Vec::with_capacity(input.items.len());
        let mut requested: HashMap<EntityId, u32> = HashMap::new();
        let mut total = Money::zero();

        for line in &input.items {
            if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
                return Err(DomainError::validation(format!(
                    "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
                )));
            }
            let product_id = parse_id(&line.product_id, "product")?;
            let product = self
                .store
                .get_product(product_id)
                .await?
                .ok_or_else(|| {
                    DomainError::validation(format!("Product {product_id} does not exist"))
                })?;

            let option_ids = parse_ids(&line.option_ids, "option")?;
            let extra_ids = parse_ids(&line.extra_ids, "extra")?;
            let price = unit_price(&product, &option_ids, &extra_ids)?;

            total = price
                .checked_multiply(line.quantity)
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| DomainError::validation("Order total is too large"))?;

            let total_quantity = requested.entry(product_id).or_default();
            *total_quantity = total_quantity
                .checked_add(line.quantity)
                .ok_or_else(|| DomainError::validation("Quantity is too large"))?;
            if product.product.has_stock
                && i64::from(*total_quantity) > i64::from(product.product.stock_quantity)
            {
                return Err(DomainError::validation(format!(
                    "Not enough stock for {}",
                    product.product.name
                )));
            }

            items.push(NewOrderItem {
                product_id,
                product_name: product.product.name.clone(),
                quantity: line.quantity,
                price,
            });
        }

        let order = self
            .store
            .insert_order(NewOrder {
                user_id,
                address: optional_text(input.address),
                phone: optional_text(input.phone),
                items,
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(
            order_id = %order.order.id,
            total = %order.order.total,
            "order placed"
        );
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: EntityId) -> Result<OrderDetail> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order", id))
    }

    /// Finds the order a gateway token was issued for.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_payment(&self, payment_id: &str, method: &str) -> Result<Option<Order>> {
        Ok(self.store.find_order_by_payment(payment_id, method).await?)
    }

    /// Records the gateway token and method on an order.
    #[tracing::instrument(skip(self))]
    pub async fn attach_payment(&self, id: EntityId, payment_id: &str, method: &str) -> Result<()> {
        if !self.store.set_order_payment(id, payment_id, method).await? {
            return Err(DomainError::not_found("order", id));
        }
        Ok(())
    }

    /// Moves an order from `from` to `to`.
    ///
    /// Returns false without writing when the stored status is no longer
    /// `from`, so concurrent callers resolve to a single transition.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, id: EntityId, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        if !from.can_transition_to(to) {
            return Err(DomainError::validation(format!(
                "Cannot move an order from {from} to {to}"
            )));
        }
        let changed = self.store.transition_order_status(id, from, to).await?;
        if changed {
            tracing::info!(order_id = %id, %from, %to, "order status changed");
        }
        Ok(changed)
    }
}
