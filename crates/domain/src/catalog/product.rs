use common::{EntityId, Money};
use serde::Deserialize;
use store::{ProductData, ProductDetail, ProductSummary, Store};
use validator::Validate;

use crate::error::{DomainError, Result};
use crate::validation::{optional_text, parse_id, parse_ids, required, slugify};

/// Product fields as submitted by the admin screens.
///
/// Products are priced one of two ways: a single `price`, or with
/// `hasVariations` a `basePrice` plus the deltas of the chosen options.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    #[validate(length(max = 255, message = "Product name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Slug must be at most 255 characters"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "common::money::optional_lira")]
    pub price: Option<Money>,
    #[serde(deserialize_with = "common::money::optional_lira")]
    pub base_price: Option<Money>,
    pub category_id: Option<String>,
    pub has_stock: bool,
    pub stock_quantity: Option<i32>,
    #[validate(length(max = 2048, message = "Image path is too long"))]
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub has_variations: bool,
    pub variation_ids: Vec<String>,
    /// Omitted leaves the current extras untouched.
    pub extra_ids: Option<Vec<String>>,
    #[validate(length(max = 255, message = "Meta title must be at most 255 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 1000, message = "Meta description must be at most 1000 characters"))]
    pub meta_desc: Option<String>,
    pub no_index: Option<bool>,
}

/// Product management.
pub struct ProductService<S: Store> {
    store: S,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProductSummary>> {
        Ok(self.store.list_products().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: EntityId) -> Result<ProductDetail> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Creates a product. Without a slug one is derived from the name.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput) -> Result<ProductDetail> {
        let data = self.prepare(input, false).await?;
        let product = self.store.insert_product(data).await?;
        tracing::info!(product_id = %product.product.id, "product created");
        Ok(product)
    }

    /// Updates a product; the slug is mandatory here.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: EntityId, input: ProductInput) -> Result<ProductDetail> {
        self.get(id).await?;
        let data = self.prepare(input, true).await?;
        self.store
            .update_product(id, data)
            .await?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::not_found("product", id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn prepare(&self, input: ProductInput, require_slug: bool) -> Result<ProductData> {
        let name = required(input.name.as_deref(), "Product name is required")?;
        input.validate()?;

        let slug = match optional_text(input.slug) {
            Some(slug) => slug,
            None if require_slug => return Err(DomainError::validation("Slug is required")),
            None => slugify(&name),
        };

        let (price, base_price, variation_ids) = if input.has_variations {
            let base_price = input
                .base_price
                .filter(Money::is_positive)
                .ok_or_else(|| DomainError::validation("A valid base price is required"))?;
            let variation_ids = parse_ids(&input.variation_ids, "variation")?;
            if variation_ids.is_empty() {
                return Err(DomainError::validation("Select at least one variation"));
            }
            (Money::zero(), base_price, variation_ids)
        } else {
            let price = input
                .price
                .filter(Money::is_positive)
                .ok_or_else(|| DomainError::validation("A valid price is required"))?;
            (price, Money::zero(), Vec::new())
        };

        let category_id = required(input.category_id.as_deref(), "Category is required")?;
        let category_id = parse_id(&category_id, "category")?;
        if self.store.get_category(category_id).await?.is_none() {
            return Err(DomainError::validation("Selected category does not exist"));
        }

        let stock_quantity = if input.has_stock {
            match input.stock_quantity {
                Some(quantity) if quantity >= 0 => quantity,
                _ => return Err(DomainError::validation("A valid stock quantity is required")),
            }
        } else {
            0
        };

        let extra_ids = match &input.extra_ids {
            Some(raw) => Some(parse_ids(raw, "extra")?),
            None => None,
        };
        self.ensure_references(extra_ids.as_deref(), &variation_ids)
            .await?;

        Ok(ProductData {
            name,
            slug,
            description: optional_text(input.description).unwrap_or_default(),
            price,
            base_price,
            category_id,
            has_stock: input.has_stock,
            stock_quantity,
            image: optional_text(input.image).unwrap_or_default(),
            ingredients: input
                .ingredients
                .into_iter()
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
            meta_title: optional_text(input.meta_title).unwrap_or_default(),
            meta_desc: optional_text(input.meta_desc).unwrap_or_default(),
            no_index: input.no_index != Some(false),
            extra_ids,
            variation_ids,
        })
    }

    async fn ensure_references(
        &self,
        extra_ids: Option<&[EntityId]>,
        variation_ids: &[EntityId],
    ) -> Result<()> {
        for id in extra_ids.unwrap_or_default() {
            if self.store.get_extra(*id).await?.is_none() {
                return Err(DomainError::validation(format!("Extra {id} does not exist")));
            }
        }
        for id in variation_ids {
            if self.store.get_variation(*id).await?.is_none() {
                return Err(DomainError::validation(format!(
                    "Variation {id} does not exist"
                )));
            }
        }
        Ok(())
    }
}
