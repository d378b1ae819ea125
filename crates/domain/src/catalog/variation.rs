use common::{EntityId, Money};
use serde::Deserialize;
use store::{OptionData, Store, StoreError, VariationData, VariationDetail, VariationWithOptions};
use validator::Validate;

use crate::error::{DomainError, Result};
use crate::validation::{optional_text, parse_id, required};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionInput {
    /// Present when editing an option that already exists.
    pub id: Option<String>,
    #[validate(length(max = 255, message = "Option name must be at most 255 characters"))]
    pub name: Option<String>,
    #[serde(deserialize_with = "common::money::optional_lira")]
    pub price: Option<Money>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct VariationInput {
    #[validate(length(max = 255, message = "Variation name must be at most 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate]
    pub options: Vec<OptionInput>,
}

impl VariationInput {
    fn into_data(self) -> Result<VariationData> {
        let name = required(self.name.as_deref(), "Variation name is required")?;
        if self.options.is_empty() {
            return Err(DomainError::validation("At least one option is required"));
        }
        self.validate()?;

        let mut options: Vec<OptionData> = Vec::with_capacity(self.options.len());
        for option in self.options {
            let id = match option.id.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(parse_id(raw, "option")?),
            };
            // Each stored option may appear once.
            if id.is_some() && options.iter().any(|o| o.id == id) {
                return Err(DomainError::validation("Duplicate option id"));
            }
            options.push(OptionData {
                id,
                name: required(option.name.as_deref(), "Every option needs a name")?,
                price: option.price.unwrap_or_default(),
                is_default: option.is_default,
            });
        }
        normalize_default(&mut options);

        Ok(VariationData {
            name,
            description: optional_text(self.description),
            options,
        })
    }
}

/// Leaves exactly one default option: the first flagged one, or else the first.
fn normalize_default(options: &mut [OptionData]) {
    let chosen = options.iter().position(|o| o.is_default).unwrap_or(0);
    for (i, option) in options.iter_mut().enumerate() {
        option.is_default = i == chosen;
    }
}

/// Management of option groups (size, spice level) and their priced options.
pub struct VariationService<S: Store> {
    store: S,
}

impl<S: Store> VariationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VariationWithOptions>> {
        Ok(self.store.list_variations().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: EntityId) -> Result<VariationDetail> {
        self.store
            .get_variation(id)
            .await?
            .ok_or_else(|| DomainError::not_found("variation", id))
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: VariationInput) -> Result<VariationWithOptions> {
        let mut data = input.into_data()?;
        // New variations have no stored options to refer to.
        for option in &mut data.options {
            option.id = None;
        }
        let variation = self.store.insert_variation(data).await?;
        tracing::info!(variation_id = %variation.variation.id, "variation created");
        Ok(variation)
    }

    /// Updates the variation and reconciles its options with the payload.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: EntityId, input: VariationInput) -> Result<VariationWithOptions> {
        let data = input.into_data()?;
        match self.store.update_variation(id, data).await {
            Ok(Some(variation)) => Ok(variation),
            Ok(None) => Err(DomainError::not_found("variation", id)),
            Err(StoreError::NotFound {
                entity: "variation option",
                id: option_id,
            }) => Err(DomainError::validation(format!(
                "Option {option_id} does not belong to this variation"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a variation, its options and its product links.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        if !self.store.delete_variation(id).await? {
            return Err(DomainError::not_found("variation", id));
        }
        Ok(())
    }
}
