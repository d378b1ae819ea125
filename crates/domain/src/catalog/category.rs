use common::EntityId;
use serde::Deserialize;
use store::{Category, CategoryData, Store};
use validator::Validate;

use crate::error::{DomainError, Result};
use crate::validation::{optional_text, parse_id, required};

/// Category fields as submitted by the admin screens.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryInput {
    #[validate(length(max = 255, message = "Category name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 255, message = "Slug must be at most 255 characters"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 2048, message = "Icon path is too long"))]
    pub icon: Option<String>,
    pub show_icon: Option<bool>,
    #[validate(length(max = 255, message = "Meta title must be at most 255 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 1000, message = "Meta description must be at most 1000 characters"))]
    pub meta_desc: Option<String>,
    /// Parent category id; empty or `"none"` means top level.
    pub parent_id: Option<String>,
    pub is_indexed: Option<bool>,
}

/// Category management.
pub struct CategoryService<S: Store> {
    store: S,
}

impl<S: Store> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: EntityId) -> Result<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    /// Creates a category. The slug must not be taken.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: CategoryInput) -> Result<Category> {
        let data = self.prepare(input, None).await?;
        if self.store.get_category_by_slug(&data.slug).await?.is_some() {
            return Err(slug_taken());
        }

        let category = self.store.insert_category(data).await.map_err(map_slug_conflict)?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    /// Replaces a category's fields. A changed slug must not be taken.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, id: EntityId, input: CategoryInput) -> Result<Category> {
        let data = self.prepare(input, Some(id)).await?;
        let current = self.get(id).await?;

        if data.slug != current.slug
            && let Some(existing) = self.store.get_category_by_slug(&data.slug).await?
            && existing.id != id
        {
            return Err(slug_taken());
        }

        self.store
            .update_category(id, data)
            .await
            .map_err(map_slug_conflict)?
            .ok_or_else(|| DomainError::not_found("category", id))
    }

    /// Deletes a category that has no products and no child categories.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: EntityId) -> Result<()> {
        self.get(id).await?;

        if self.store.count_category_products(id).await? > 0 {
            return Err(DomainError::validation(
                "Category still has products; delete them first",
            ));
        }
        if self.store.count_child_categories(id).await? > 0 {
            return Err(DomainError::validation(
                "Category still has subcategories; delete them first",
            ));
        }

        if !self.store.delete_category(id).await? {
            return Err(DomainError::not_found("category", id));
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn prepare(&self, input: CategoryInput, self_id: Option<EntityId>) -> Result<CategoryData> {
        let name = required(input.name.as_deref(), "Category name and slug are required")?;
        let slug = required(input.slug.as_deref(), "Category name and slug are required")?;
        input.validate()?;
        let parent_id = self.resolve_parent(input.parent_id.as_deref(), self_id).await?;

        Ok(CategoryData {
            name,
            slug,
            description: optional_text(input.description),
            icon: optional_text(input.icon),
            show_icon: input.show_icon.unwrap_or(false),
            meta_title: optional_text(input.meta_title),
            meta_desc: optional_text(input.meta_desc),
            parent_id,
            is_indexed: input.is_indexed != Some(false),
        })
    }

    /// Resolves the parent reference. Categories nest one level deep.
    async fn resolve_parent(
        &self,
        raw: Option<&str>,
        self_id: Option<EntityId>,
    ) -> Result<Option<EntityId>> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some("none") => return Ok(None),
            Some(raw) => raw,
        };
        let parent_id = parse_id(raw, "parent category")?;

        if Some(parent_id) == self_id {
            return Err(DomainError::validation(
                "A category cannot be its own parent",
            ));
        }
        let parent = self
            .store
            .get_category(parent_id)
            .await?
            .ok_or_else(|| DomainError::validation("Parent category not found"))?;
        if parent.parent_id.is_some() {
            return Err(DomainError::validation(
                "Parent category must be a top-level category",
            ));
        }
        if let Some(id) = self_id
            && self.store.count_child_categories(id).await? > 0
        {
            return Err(DomainError::validation(
                "A category with subcategories cannot be nested",
            ));
        }
        Ok(Some(parent_id))
    }
}

fn slug_taken() -> DomainError {
    DomainError::Conflict("This slug is already in use; choose another one".to_string())
}

fn map_slug_conflict(e: store::StoreError) -> DomainError {
    match e {
        store::StoreError::UniqueViolation { .. } => slug_taken(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryStore;

    fn input(name: &str, slug: &str) -> CategoryInput {
        CategoryInput {
            name: Some(name.into()),
            slug: Some(slug.into()),
            ..Default::default()
        }
    }

    fn service() -> CategoryService<InMemoryStore> {
        CategoryService::new(InMemoryStore::new())
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let service = service();
        let mut data = input("Soups", "soups");
        data.parent_id = Some("none".into());
        data.description = Some("   ".into());

        let category = service.create(data).await.unwrap();
        assert!(category.is_indexed);
        assert!(!category.show_icon);
        assert_eq!(category.parent_id, None);
        assert_eq!(category.description, None);
    }

    #[tokio::test]
    async fn name_and_slug_required() {
        let service = service();
        let err = service
            .create(CategoryInput {
                name: Some("Soups".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let service = service();
        service.create(input("Soups", "soups")).await.unwrap();
        let err = service.create(input("Other", "soups")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_keeping_own_slug_is_allowed() {
        let service = service();
        let created = service.create(input("Soups", "soups")).await.unwrap();
        let updated = service
            .update(created.id, input("Hot soups", "soups"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Hot soups");
    }

    #[tokio::test]
    async fn update_to_taken_slug_conflicts() {
        let service = service();
        service.create(input("Soups", "soups")).await.unwrap();
        let drinks = service.create(input("Drinks", "drinks")).await.unwrap();
        let err = service
            .update(drinks.id, input("Drinks", "soups"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn nesting_is_one_level_deep() {
        let service = service();
        let mains = service.create(input("Mains", "mains")).await.unwrap();

        let mut grill = input("Grill", "grill");
        grill.parent_id = Some(mains.id.to_string());
        let grill = service.create(grill).await.unwrap();
        assert_eq!(grill.parent_id, Some(mains.id));

        let mut skewers = input("Skewers", "skewers");
        skewers.parent_id = Some(grill.id.to_string());
        let err = service.create(skewers).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn category_cannot_parent_itself() {
        let service = service();
        let mains = service.create(input("Mains", "mains")).await.unwrap();
        let mut data = input("Mains", "mains");
        data.parent_id = Some(mains.id.to_string());
        let err = service.update(mains.id, data).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_parent_rejected() {
        let service = service();
        let mut data = input("Grill", "grill");
        data.parent_id = Some(EntityId::new().to_string());
        let err = service.create(data).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_refused_while_children_exist() {
        let service = service();
        let mains = service.create(input("Mains", "mains")).await.unwrap();
        let mut grill = input("Grill", "grill");
        grill.parent_id = Some(mains.id.to_string());
        let grill = service.create(grill).await.unwrap();

        let err = service.delete(mains.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        service.delete(grill.id).await.unwrap();
        service.delete(mains.id).await.unwrap();
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let err = service().delete(EntityId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
