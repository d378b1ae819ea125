//! Public menu assembled from the catalog.

use std::collections::HashMap;

use common::EntityId;
use serde::Serialize;
use store::{Category, ProductDetail, Store};

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<ProductDetail>,
    pub children: Vec<MenuSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Menu {
    pub categories: Vec<MenuSection>,
}

pub struct MenuService<S: Store> {
    store: S,
}

impl<S: Store> MenuService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Builds the menu: top-level categories by name, each with its indexed
    /// subcategories and the full detail of every product.
    #[tracing::instrument(skip(self))]
    pub async fn menu(&self) -> Result<Menu> {
        let categories = self.store.list_categories().await?;

        let mut products: HashMap<EntityId, Vec<ProductDetail>> = HashMap::new();
        for summary in self.store.list_products().await? {
            if let Some(detail) = self.store.get_product(summary.product.id).await? {
                products
                    .entry(detail.product.category_id)
                    .or_default()
                    .push(detail);
            }
        }

        let mut take_products = |id: EntityId| {
            let mut list = products.remove(&id).unwrap_or_default();
            list.sort_by(|a, b| a.product.name.cmp(&b.product.name));
            list
        };

        let mut sections = Vec::new();
        for parent in categories.iter().filter(|c| c.parent_id.is_none()) {
            let children = categories
                .iter()
                .filter(|c| c.parent_id == Some(parent.id) && c.is_indexed)
                .map(|child| MenuSection {
                    products: take_products(child.id),
                    category: child.clone(),
                    children: Vec::new(),
                })
                .collect();
            sections.push(MenuSection {
                products: take_products(parent.id),
                category: parent.clone(),
                children,
            });
        }

        Ok(Menu {
            categories: sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use store::{CategoryData, CategoryStore, InMemoryStore, ProductData, ProductStore};

    async fn category(store: &InMemoryStore, name: &str, parent: Option<EntityId>, indexed: bool) -> Category {
        store
            .insert_category(CategoryData {
                name: name.into(),
                slug: name.to_lowercase(),
                parent_id: parent,
                is_indexed: indexed,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn product(store: &InMemoryStore, name: &str, category_id: EntityId) {
        store
            .insert_product(ProductData {
                name: name.into(),
                slug: name.to_lowercase(),
                description: String::new(),
                price: Money::from_cents(5000),
                base_price: Money::zero(),
                category_id,
                has_stock: false,
                stock_quantity: 0,
                image: String::new(),
                ingredients: vec![],
                meta_title: String::new(),
                meta_desc: String::new(),
                no_index: true,
                extra_ids: None,
                variation_ids: vec![],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn menu_nests_indexed_children() {
        let store = InMemoryStore::new();
        let mains = category(&store, "Mains", None, true).await;
        let grill = category(&store, "Grill", Some(mains.id), true).await;
        category(&store, "Secret", Some(mains.id), false).await;
        let drinks = category(&store, "Drinks", None, true).await;
        product(&store, "Ayran", drinks.id).await;
        product(&store, "Şiş", grill.id).await;
        product(&store, "Adana", grill.id).await;

        let menu = MenuService::new(store).menu().await.unwrap();
        let names: Vec<_> = menu.categories.iter().map(|s| s.category.name.as_str()).collect();
        assert_eq!(names, vec!["Drinks", "Mains"]);

        let mains_section = &menu.categories[1];
        assert_eq!(mains_section.children.len(), 1);
        let grill_products: Vec<_> = mains_section.children[0]
            .products
            .iter()
            .map(|p| p.product.name.as_str())
            .collect();
        assert_eq!(grill_products, vec!["Adana", "Şiş"]);
    }
}
