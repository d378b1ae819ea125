use common::{EntityId, Money};
use serde::Deserialize;
use store::{Extra, ExtraData, ExtraDetail, Store};
use validator::Validate;

use crate::error::{DomainError, Result};
use crate::validation::required;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ExtraInput {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[serde(deserialize_with = "common::money::optional_lira")]
    pub price: Option<Money>,
}

impl ExtraInput {
    fn into_data(self) -> Result<ExtraData> {
        let name = required(self.name.as_deref(), "Name and price are required")?;
        self.validate()?;
        let price = self
            .price
            .filter(Money::is_positive)
            .ok_or_else(|| DomainError::validation("Price must be greater than zero"))?;
        Ok(ExtraData { name, price })
    }
}

/// Management of optional paid add-ons (extra cheese, sauces).
pub struct ExtraService<S: Store> {
    store: S,
}

impl<S: Store> ExtraService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Extra>> {
        Ok(self.store.list_extras().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: EntityId) -> Result<ExtraDetail> {
        self.store
            .get_extra(id)
            .await?
            .ok_or_else(|| DomainError::not_found("extra", id))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: ExtraInput) -> Result<Extra> {
        let extra = self.store.insert_extra(input.into_data()?).await?;
        tracing::info!(extra_id = %extra.id, "extra created");
        Ok(extra)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: EntityId, input: ExtraInput) -> Result<Extra> {
        let data = input.into_data()?;
        self.store
            .update_extra(id, data)
            .await?
            .ok_or_else(|| DomainError::not_found("extra", id))
    }

    /// Deletes an extra and detaches it from every product.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        if !self.store.delete_extra(id).await? {
            return Err(DomainError::not_found("extra", id));
        }
        Ok(())
    }
}
