use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::EntityId;
use tokio::sync::RwLock;

use crate::model::{
    Category, CategoryData, CategoryRef, Extra, ExtraData, ExtraDetail, NewOrder, NewUser, Order,
    OrderDetail, OrderItem, OrderStatus, Product, ProductData, ProductDetail, ProductRef,
    ProductSummary, Settings, User, Variation, VariationData, VariationDetail, VariationOption,
    VariationSummary, VariationWithOptions,
};
use crate::store::{
    CategoryStore, ExtraStore, OrderStore, ProductStore, SettingsStore, UserStore, VariationStore,
};
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    product_extras: Vec<(EntityId, EntityId)>,
    product_variations: Vec<(EntityId, EntityId)>,
    extras: Vec<Extra>,
    variations: Vec<Variation>,
    options: Vec<VariationOption>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    users: Vec<User>,
    settings: Option<Settings>,
}

impl State {
    fn category(&self, id: EntityId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn category_ref(&self, id: EntityId) -> Option<CategoryRef> {
        self.category(id).map(|c| CategoryRef {
            id: c.id,
            name: c.name.clone(),
        })
    }

    fn variation_with_options(&self, variation: &Variation) -> VariationWithOptions {
        VariationWithOptions {
            variation: variation.clone(),
            options: self
                .options
                .iter()
                .filter(|o| o.variation_id == variation.id)
                .cloned()
                .collect(),
        }
    }

    fn product_variations(&self, product_id: EntityId) -> Vec<&Variation> {
        self.product_variations
            .iter()
            .filter(|(p, _)| *p == product_id)
            .filter_map(|(_, v)| self.variations.iter().find(|x| x.id == *v))
            .collect()
    }

    fn summary(&self, product: &Product) -> ProductSummary {
        let variations: Vec<VariationSummary> = self
            .product_variations(product.id)
            .into_iter()
            .map(|v| VariationSummary {
                id: v.id,
                name: v.name.clone(),
                option_count: self
                    .options
                    .iter()
                    .filter(|o| o.variation_id == v.id)
                    .count() as i64,
            })
            .collect();
        ProductSummary {
            product: product.clone(),
            category: self.category_ref(product.category_id),
            has_variations: !variations.is_empty(),
            in_stock: product.stock_quantity > 0,
            variations,
        }
    }

    fn detail(&self, product: &Product) -> ProductDetail {
        let extras = self
            .product_extras
            .iter()
            .filter(|(p, _)| *p == product.id)
            .filter_map(|(_, e)| self.extras.iter().find(|x| x.id == *e))
            .cloned()
            .collect();
        let variations: Vec<VariationWithOptions> = self
            .product_variations(product.id)
            .into_iter()
            .map(|v| self.variation_with_options(v))
            .collect();
        ProductDetail {
            product: product.clone(),
            category: self.category_ref(product.category_id),
            has_variations: !variations.is_empty(),
            in_stock: product.stock_quantity > 0,
            extras,
            variations,
        }
    }

    fn products_linked(&self, links: &[(EntityId, EntityId)], target: EntityId) -> Vec<ProductRef> {
        links
            .iter()
            .filter(|(_, t)| *t == target)
            .filter_map(|(p, _)| self.products.iter().find(|x| x.id == *p))
            .map(|p| ProductRef {
                id: p.id,
                name: p.name.clone(),
                image: p.image.clone(),
            })
            .collect()
    }

    fn check_product_refs(&self, data: &ProductData) -> Result<()> {
        if self.category(data.category_id).is_none() {
            return Err(StoreError::not_found("category", data.category_id));
        }
        if let Some(extra_ids) = &data.extra_ids
            && let Some(missing) = extra_ids
                .iter()
                .find(|id| !self.extras.iter().any(|e| e.id == **id))
        {
            return Err(StoreError::not_found("extra", missing));
        }
        if let Some(missing) = data
            .variation_ids
            .iter()
            .find(|id| !self.variations.iter().any(|v| v.id == **id))
        {
            return Err(StoreError::not_found("variation", missing));
        }
        Ok(())
    }

    fn replace_product_links(&mut self, product_id: EntityId, data: &ProductData) {
        if let Some(extra_ids) = &data.extra_ids {
            self.product_extras.retain(|(p, _)| *p != product_id);
            for extra_id in extra_ids {
                self.product_extras.push((product_id, *extra_id));
            }
        }
        self.product_variations.retain(|(p, _)| *p != product_id);
        for variation_id in &data.variation_ids {
            self.product_variations.push((product_id, *variation_id));
        }
    }
}

fn apply_category(category: &mut Category, data: CategoryData) {
    category.name = data.name;
    category.slug = data.slug;
    category.description = data.description;
    category.icon = data.icon;
    category.show_icon = data.show_icon;
    category.meta_title = data.meta_title;
    category.meta_desc = data.meta_desc;
    category.parent_id = data.parent_id;
    category.is_indexed = data.is_indexed;
    category.updated_at = Utc::now();
}

fn apply_product(product: &mut Product, data: &ProductData) {
    product.name = data.name.clone();
    product.slug = data.slug.clone();
    product.description = data.description.clone();
    product.price = data.price;
    product.base_price = data.base_price;
    product.category_id = data.category_id;
    product.has_stock = data.has_stock;
    product.stock_quantity = data.stock_quantity;
    product.image = data.image.clone();
    product.ingredients = data.ingredients.clone();
    product.meta_title = data.meta_title.clone();
    product.meta_desc = data.meta_desc.clone();
    product.no_index = data.no_index;
    product.updated_at = Utc::now();
}

/// In-memory store implementation for tests and database-less runs.
///
/// Mirrors the unique and foreign-key checks of the PostgreSQL schema so the
/// services see the same errors from either backend.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: EntityId) -> Result<Option<Category>> {
        Ok(self.state.read().await.category(id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn insert_category(&self, data: CategoryData) -> Result<Category> {
        let mut state = self.state.write().await;
        if state.categories.iter().any(|c| c.slug == data.slug) {
            return Err(StoreError::UniqueViolation {
                constraint: "category_slug_key".to_string(),
            });
        }
        if let Some(parent_id) = data.parent_id
            && state.category(parent_id).is_none()
        {
            return Err(StoreError::not_found("category", parent_id));
        }

        let now = Utc::now();
        let mut category = Category {
            id: EntityId::new(),
            name: String::new(),
            slug: String::new(),
            description: None,
            icon: None,
            show_icon: false,
            meta_title: None,
            meta_desc: None,
            parent_id: None,
            is_indexed: true,
            created_at: now,
            updated_at: now,
        };
        apply_category(&mut category, data);
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: EntityId,
        data: CategoryData,
    ) -> Result<Option<Category>> {
        let mut state = self.state.write().await;
        if state
            .categories
            .iter()
            .any(|c| c.slug == data.slug && c.id != id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "category_slug_key".to_string(),
            });
        }
        let Some(category) = state.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        apply_category(category, data);
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: EntityId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        Ok(state.categories.len() != before)
    }

    async fn count_child_categories(&self, id: EntityId) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .count() as i64)
    }

    async fn count_category_products(&self, id: EntityId) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .filter(|p| p.category_id == id)
            .count() as i64)
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .rev()
            .map(|p| state.summary(p))
            .collect())
    }

    async fn get_product(&self, id: EntityId) -> Result<Option<ProductDetail>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| state.detail(p)))
    }

    async fn insert_product(&self, data: ProductData) -> Result<ProductDetail> {
        let mut state = self.state.write().await;
        state.check_product_refs(&data)?;

        let now = Utc::now();
        let mut product = Product {
            id: EntityId::new(),
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            price: Default::default(),
            base_price: Default::default(),
            category_id: data.category_id,
            has_stock: false,
            stock_quantity: 0,
            image: String::new(),
            ingredients: Vec::new(),
            meta_title: String::new(),
            meta_desc: String::new(),
            no_index: true,
            created_at: now,
            updated_at: now,
        };
        apply_product(&mut product, &data);
        state.products.push(product.clone());
        state.replace_product_links(product.id, &data);
        Ok(state.detail(&product))
    }

    async fn update_product(
        &self,
        id: EntityId,
        data: ProductData,
    ) -> Result<Option<ProductDetail>> {
        let mut state = self.state.write().await;
        if !state.products.iter().any(|p| p.id == id) {
            return Ok(None);
        }
        state.check_product_refs(&data)?;

        let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        apply_product(product, &data);
        let product = product.clone();
        state.replace_product_links(id, &data);
        Ok(Some(state.detail(&product)))
    }

    async fn delete_product(&self, id: EntityId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Ok(false);
        }
        state.product_extras.retain(|(p, _)| *p != id);
        state.product_variations.retain(|(p, _)| *p != id);
        for item in state.order_items.iter_mut() {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ExtraStore for InMemoryStore {
    async fn list_extras(&self) -> Result<Vec<Extra>> {
        let state = self.state.read().await;
        Ok(state.extras.iter().rev().cloned().collect())
    }

    async fn get_extra(&self, id: EntityId) -> Result<Option<ExtraDetail>> {
        let state = self.state.read().await;
        Ok(state
            .extras
            .iter()
            .find(|e| e.id == id)
            .map(|extra| ExtraDetail {
                extra: extra.clone(),
                products: state.products_linked(&state.product_extras, id),
            }))
    }

    async fn insert_extra(&self, data: ExtraData) -> Result<Extra> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let extra = Extra {
            id: EntityId::new(),
            name: data.name,
            price: data.price,
            created_at: now,
            updated_at: now,
        };
        state.extras.push(extra.clone());
        Ok(extra)
    }

    async fn update_extra(&self, id: EntityId, data: ExtraData) -> Result<Option<Extra>> {
        let mut state = self.state.write().await;
        let Some(extra) = state.extras.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        extra.name = data.name;
        extra.price = data.price;
        extra.updated_at = Utc::now();
        Ok(Some(extra.clone()))
    }

    async fn delete_extra(&self, id: EntityId) -> Result<bool> {
        let mut state = self.state.write().await;
        state.product_extras.retain(|(_, e)| *e != id);
        let before = state.extras.len();
        state.extras.retain(|e| e.id != id);
        Ok(state.extras.len() != before)
    }
}

#[async_trait]
impl VariationStore for InMemoryStore {
    async fn list_variations(&self) -> Result<Vec<VariationWithOptions>> {
        let state = self.state.read().await;
        Ok(state
            .variations
            .iter()
            .rev()
            .map(|v| state.variation_with_options(v))
            .collect())
    }

    async fn get_variation(&self, id: EntityId) -> Result<Option<VariationDetail>> {
        let state = self.state.read().await;
        Ok(state
            .variations
            .iter()
            .find(|v| v.id == id)
            .map(|variation| {
                let with_options = state.variation_with_options(variation);
                VariationDetail {
                    variation: with_options.variation,
                    options: with_options.options,
                    products: state.products_linked(&state.product_variations, id),
                }
            }))
    }

    async fn insert_variation(&self, data: VariationData) -> Result<VariationWithOptions> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let variation = Variation {
            id: EntityId::new(),
            name: data.name,
            description: data.description,
            created_at: now,
            updated_at: now,
        };
        for option in data.options {
            state.options.push(VariationOption {
                id: EntityId::new(),
                variation_id: variation.id,
                name: option.name,
                price: option.price,
                is_default: option.is_default,
                created_at: now,
                updated_at: now,
            });
        }
        state.variations.push(variation.clone());
        Ok(state.variation_with_options(&variation))
    }

    async fn update_variation(
        &self,
        id: EntityId,
        data: VariationData,
    ) -> Result<Option<VariationWithOptions>> {
        let mut state = self.state.write().await;
        if !state.variations.iter().any(|v| v.id == id) {
            return Ok(None);
        }
        if let Some(foreign) = data.options.iter().filter_map(|o| o.id).find(|option_id| {
            !state
                .options
                .iter()
                .any(|o| o.id == *option_id && o.variation_id == id)
        }) {
            return Err(StoreError::not_found("variation option", foreign));
        }

        let now = Utc::now();
        let keep: Vec<EntityId> = data.options.iter().filter_map(|o| o.id).collect();
        state
            .options
            .retain(|o| o.variation_id != id || keep.contains(&o.id));

        for option in data.options {
            match option.id {
                Some(option_id) => {
                    if let Some(stored) = state.options.iter_mut().find(|o| o.id == option_id) {
                        stored.name = option.name;
                        stored.price = option.price;
                        stored.is_default = option.is_default;
                        stored.updated_at = now;
                    }
                }
                None => state.options.push(VariationOption {
                    id: EntityId::new(),
                    variation_id: id,
                    name: option.name,
                    price: option.price,
                    is_default: option.is_default,
                    created_at: now,
                    updated_at: now,
                }),
            }
        }

        let Some(variation) = state.variations.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        variation.name = data.name;
        variation.description = data.description;
        variation.updated_at = now;
        let variation = variation.clone();
        Ok(Some(state.variation_with_options(&variation)))
    }

    async fn delete_variation(&self, id: EntityId) -> Result<bool> {
        let mut state = self.state.write().await;
        state.product_variations.retain(|(_, v)| *v != id);
        state.options.retain(|o| o.variation_id != id);
        let before = state.variations.len();
        state.variations.retain(|v| v.id != id);
        Ok(state.variations.len() != before)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, new_order: NewOrder) -> Result<OrderDetail> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter()
            .find(|u| u.id == new_order.user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", new_order.user_id))?;

        let now = Utc::now();
        let order = Order {
            id: EntityId::new(),
            user_id: new_order.user_id,
            status: OrderStatus::Pending,
            total: new_order.total(),
            address: new_order.address,
            phone: new_order.phone,
            payment_id: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = new_order
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: EntityId::new(),
                order_id: order.id,
                product_id: Some(item.product_id),
                product_name: item.product_name,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        state.orders.push(order.clone());
        state.order_items.extend(items.iter().cloned());
        Ok(OrderDetail {
            order,
            items,
            user: Some(user),
        })
    }

    async fn get_order(&self, id: EntityId) -> Result<Option<OrderDetail>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).map(|order| {
            OrderDetail {
                order: order.clone(),
                items: state
                    .order_items
                    .iter()
                    .filter(|i| i.order_id == id)
                    .cloned()
                    .collect(),
                user: state.users.iter().find(|u| u.id == order.user_id).cloned(),
            }
        }))
    }

    async fn find_order_by_payment(
        &self,
        payment_id: &str,
        method: &str,
    ) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| {
                o.payment_id.as_deref() == Some(payment_id)
                    && o.payment_method.as_deref() == Some(method)
            })
            .cloned())
    }

    async fn set_order_payment(
        &self,
        id: EntityId,
        payment_id: &str,
        method: &str,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        order.payment_id = Some(payment_id.to_string());
        order.payment_method = Some(method.to_string());
        order.updated_at = Utc::now();
        Ok(true)
    }

    async fn transition_order_status(
        &self,
        id: EntityId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::UniqueViolation {
                constraint: "app_user_email_key".to_string(),
            });
        }
        let user = User {
            id: EntityId::new(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: EntityId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl SettingsStore for InMemoryStore {
    async fn get_or_create_settings(&self) -> Result<Settings> {
        let mut state = self.state.write().await;
        Ok(state.settings.get_or_insert_with(Settings::default).clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<Settings> {
        let mut state = self.state.write().await;
        let mut saved = settings.clone();
        saved.updated_at = Utc::now();
        if let Some(existing) = &state.settings {
            saved.created_at = existing.created_at;
        }
        state.settings = Some(saved.clone());
        Ok(saved)
    }
}
