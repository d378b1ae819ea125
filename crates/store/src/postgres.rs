use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{EntityId, Money};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::model::{
    Category, CategoryData, CategoryRef, Extra, ExtraData, ExtraDetail, NewOrder, NewUser, Order,
    OrderDetail, OrderItem, OrderStatus, Product, ProductData, ProductDetail, ProductRef,
    ProductSummary, Role, Settings, User, Variation, VariationData, VariationDetail,
    VariationOption, VariationSummary, VariationWithOptions,
};
use crate::store::{
    CategoryStore, ExtraStore, OrderStore, ProductStore, SettingsStore, UserStore, VariationStore,
};
use crate::{Result, StoreError};

const CATEGORY_COLUMNS: &str = "id, name, slug, description, icon, show_icon, meta_title, \
     meta_desc, parent_id, is_indexed, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.slug, p.description, p.price, p.base_price, \
     p.category_id, p.has_stock, p.stock_quantity, p.image, p.ingredients, p.meta_title, \
     p.meta_desc, p.no_index, p.created_at, p.updated_at, c.name AS category_name";

const ORDER_COLUMNS: &str = "id, user_id, status, total, address, phone, payment_id, \
     payment_method, created_at, updated_at";

const SETTINGS_COLUMNS: &str = "site_name, logo, favicon, email, phone, address, meta_title, \
     meta_description, google_login_key, iyzico_key, iyzico_secret_key, iyzico_sandbox_mode, \
     paytr_key, paytr_salt, paytr_merchant_id, sms_api_key, sms_api_secret, sms_api_sender, \
     navbar_color, footer_color, primary_color, secondary_color, google_analytics_id, \
     google_console_id, created_at, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// Maps constraint failures on writes to store errors the services understand.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        tracing::warn!(
            code = db_err.code().as_deref().unwrap_or_default(),
            %constraint,
            "write rejected by constraint"
        );
        match db_err.code().as_deref() {
            Some("23505") => return StoreError::UniqueViolation { constraint },
            Some("23503") => {
                let entity = if constraint.contains("category") || constraint.contains("parent")
                {
                    "category"
                } else if constraint.contains("extra") {
                    "extra"
                } else if constraint.contains("variation") {
                    "variation"
                } else if constraint.contains("user") {
                    "user"
                } else {
                    "row"
                };
                return StoreError::NotFound {
                    entity,
                    id: constraint,
                };
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

fn entity_id(row: &PgRow, column: &str) -> Result<EntityId> {
    Ok(EntityId::from_uuid(row.try_get::<Uuid, _>(column)?))
}

fn optional_entity_id(row: &PgRow, column: &str) -> Result<Option<EntityId>> {
    Ok(row
        .try_get::<Option<Uuid>, _>(column)?
        .map(EntityId::from_uuid))
}

fn money(row: &PgRow, column: &str) -> Result<Money> {
    Ok(Money::from_cents(row.try_get::<i64, _>(column)?))
}

fn uuids(ids: &[EntityId]) -> Vec<Uuid> {
    ids.iter().map(EntityId::as_uuid).collect()
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            icon: row.try_get("icon")?,
            show_icon: row.try_get("show_icon")?,
            meta_title: row.try_get("meta_title")?,
            meta_desc: row.try_get("meta_desc")?,
            parent_id: optional_entity_id(row, "parent_id")?,
            is_indexed: row.try_get("is_indexed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Decodes a product row selected with [`PRODUCT_COLUMNS`].
    fn row_to_product(row: &PgRow) -> Result<(Product, Option<CategoryRef>)> {
        let product = Product {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            description: row.try_get("description")?,
            price: money(row, "price")?,
            base_price: money(row, "base_price")?,
            category_id: entity_id(row, "category_id")?,
            has_stock: row.try_get("has_stock")?,
            stock_quantity: row.try_get("stock_quantity")?,
            image: row.try_get("image")?,
            ingredients: row.try_get("ingredients")?,
            meta_title: row.try_get("meta_title")?,
            meta_desc: row.try_get("meta_desc")?,
            no_index: row.try_get("no_index")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };
        let category = row
            .try_get::<Option<String>, _>("category_name")?
            .map(|name| CategoryRef {
                id: product.category_id,
                name,
            });
        Ok((product, category))
    }

    fn row_to_extra(row: &PgRow) -> Result<Extra> {
        Ok(Extra {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            price: money(row, "price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_variation(row: &PgRow) -> Result<Variation> {
        Ok(Variation {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_option(row: &PgRow) -> Result<VariationOption> {
        Ok(VariationOption {
            id: entity_id(row, "id")?,
            variation_id: entity_id(row, "variation_id")?,
            name: row.try_get("name")?,
            price: money(row, "price")?,
            is_default: row.try_get("is_default")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product_ref(row: &PgRow) -> Result<ProductRef> {
        Ok(ProductRef {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            image: row.try_get("image")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: entity_id(row, "id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse::<Role>()?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: entity_id(row, "id")?,
            user_id: entity_id(row, "user_id")?,
            status: status.parse::<OrderStatus>()?,
            total: money(row, "total")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            payment_id: row.try_get("payment_id")?,
            payment_method: row.try_get("payment_method")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i32 = row.try_get("quantity")?;
        Ok(OrderItem {
            id: entity_id(row, "id")?,
            order_id: entity_id(row, "order_id")?,
            product_id: optional_entity_id(row, "product_id")?,
            product_name: row.try_get("product_name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::InvalidData(format!("negative quantity {quantity}")))?,
            price: money(row, "price")?,
        })
    }

    fn row_to_settings(row: &PgRow) -> Result<Settings> {
        Ok(Settings {
            site_name: row.try_get("site_name")?,
            logo: row.try_get("logo")?,
            favicon: row.try_get("favicon")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            meta_title: row.try_get("meta_title")?,
            meta_description: row.try_get("meta_description")?,
            google_login_key: row.try_get("google_login_key")?,
            iyzico_key: row.try_get("iyzico_key")?,
            iyzico_secret_key: row.try_get("iyzico_secret_key")?,
            iyzico_sandbox_mode: row.try_get("iyzico_sandbox_mode")?,
            paytr_key: row.try_get("paytr_key")?,
            paytr_salt: row.try_get("paytr_salt")?,
            paytr_merchant_id: row.try_get("paytr_merchant_id")?,
            sms_api_key: row.try_get("sms_api_key")?,
            sms_api_secret: row.try_get("sms_api_secret")?,
            sms_api_sender: row.try_get("sms_api_sender")?,
            navbar_color: row.try_get("navbar_color")?,
            footer_color: row.try_get("footer_color")?,
            primary_color: row.try_get("primary_color")?,
            secondary_color: row.try_get("secondary_color")?,
            google_analytics_id: row.try_get("google_analytics_id")?,
            google_console_id: row.try_get("google_console_id")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    /// Loads options for the given variations, in their stored order.
    async fn options_for(&self, variation_ids: &[Uuid]) -> Result<Vec<VariationOption>> {
        let rows = sqlx::query(
            r#"
            SELECT id, variation_id, name, price, is_default, created_at, updated_at
            FROM variation_option
            WHERE variation_id = ANY($1)
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(variation_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_option).collect()
    }

    /// Attaches options to each variation, keeping the variation order.
    async fn with_options(&self, variations: Vec<Variation>) -> Result<Vec<VariationWithOptions>> {
        let ids: Vec<Uuid> = variations.iter().map(|v| v.id.as_uuid()).collect();
        let mut by_variation: HashMap<EntityId, Vec<VariationOption>> = HashMap::new();
        for option in self.options_for(&ids).await? {
            by_variation
                .entry(option.variation_id)
                .or_default()
                .push(option);
        }

        Ok(variations
            .into_iter()
            .map(|variation| VariationWithOptions {
                options: by_variation.remove(&variation.id).unwrap_or_default(),
                variation,
            })
            .collect())
    }

    async fn replace_product_links(
        conn: &mut PgConnection,
        product_id: EntityId,
        data: &ProductData,
    ) -> Result<()> {
        if let Some(extra_ids) = &data.extra_ids {
            sqlx::query("DELETE FROM product_extra WHERE product_id = $1")
                .bind(product_id.as_uuid())
                .execute(&mut *conn)
                .await?;
            for (position, extra_id) in extra_ids.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO product_extra (product_id, extra_id, position) VALUES ($1, $2, $3)",
                )
                .bind(product_id.as_uuid())
                .bind(extra_id.as_uuid())
                .bind(position as i32)
                .execute(&mut *conn)
                .await
                .map_err(map_write_error)?;
            }
        }

        sqlx::query("DELETE FROM product_variation WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .execute(&mut *conn)
            .await?;
        for (position, variation_id) in data.variation_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_variation (product_id, variation_id, position) VALUES ($1, $2, $3)",
            )
            .bind(product_id.as_uuid())
            .bind(variation_id.as_uuid())
            .bind(position as i32)
            .execute(&mut *conn)
            .await
            .map_err(map_write_error)?;
        }
        Ok(())
    }

    async fn load_product_detail(&self, id: EntityId) -> Result<ProductDetail> {
        self.get_product(id)
            .await?
            .ok_or_else(|| StoreError::not_found("product", id))
    }
}

#[async_trait]
impl CategoryStore for PostgresStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM category ORDER BY name ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_category).collect()
    }

    async fn get_category(&self, id: EntityId) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE slug = $1");
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    #[tracing::instrument(skip(self, data), fields(slug = %data.slug))]
    async fn insert_category(&self, data: CategoryData) -> Result<Category> {
        let sql = format!(
            r#"
            INSERT INTO category (id, name, slug, description, icon, show_icon, meta_title,
                                  meta_desc, parent_id, is_indexed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(EntityId::new().as_uuid())
            .bind(&data.name)
            .bind(&data.slug)
            .bind(&data.description)
            .bind(&data.icon)
            .bind(data.show_icon)
            .bind(&data.meta_title)
            .bind(&data.meta_desc)
            .bind(data.parent_id.map(|id| id.as_uuid()))
            .bind(data.is_indexed)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Self::row_to_category(&row)
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_category(
        &self,
        id: EntityId,
        data: CategoryData,
    ) -> Result<Option<Category>> {
        let sql = format!(
            r#"
            UPDATE category
            SET name = $2, slug = $3, description = $4, icon = $5, show_icon = $6,
                meta_title = $7, meta_desc = $8, parent_id = $9, is_indexed = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(&data.name)
            .bind(&data.slug)
            .bind(&data.description)
            .bind(&data.icon)
            .bind(data.show_icon)
            .bind(&data.meta_title)
            .bind(&data.meta_desc)
            .bind(data.parent_id.map(|id| id.as_uuid()))
            .bind(data.is_indexed)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete_category(&self, id: EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_child_categories(&self, id: EntityId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE parent_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_category_products(&self, id: EntityId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE category_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM product p
            LEFT JOIN category c ON c.id = p.category_id
            ORDER BY p.created_at DESC
            "#
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let summary_rows = sqlx::query(
            r#"
            SELECT pv.product_id, v.id, v.name, COUNT(o.id) AS option_count
            FROM product_variation pv
            JOIN variation v ON v.id = pv.variation_id
            LEFT JOIN variation_option o ON o.variation_id = v.id
            GROUP BY pv.product_id, pv.position, v.id, v.name
            ORDER BY pv.position ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<EntityId, Vec<VariationSummary>> = HashMap::new();
        for row in &summary_rows {
            by_product
                .entry(entity_id(row, "product_id")?)
                .or_default()
                .push(VariationSummary {
                    id: entity_id(row, "id")?,
                    name: row.try_get("name")?,
                    option_count: row.try_get("option_count")?,
                });
        }

        rows.iter()
            .map(|row| {
                let (product, category) = Self::row_to_product(row)?;
                let variations = by_product.remove(&product.id).unwrap_or_default();
                Ok(ProductSummary {
                    in_stock: product.stock_quantity > 0,
                    has_variations: !variations.is_empty(),
                    product,
                    category,
                    variations,
                })
            })
            .collect()
    }

    async fn get_product(&self, id: EntityId) -> Result<Option<ProductDetail>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM product p
            LEFT JOIN category c ON c.id = p.category_id
            WHERE p.id = $1
            "#
        );
        let Some(row) = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let (product, category) = Self::row_to_product(&row)?;

        let extra_rows = sqlx::query(
            r#"
            SELECT e.id, e.name, e.price, e.created_at, e.updated_at
            FROM product_extra pe
            JOIN extra e ON e.id = pe.extra_id
            WHERE pe.product_id = $1
            ORDER BY pe.position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let extras = extra_rows
            .iter()
            .map(Self::row_to_extra)
            .collect::<Result<Vec<_>>>()?;

        let variation_rows = sqlx::query(
            r#"
            SELECT v.id, v.name, v.description, v.created_at, v.updated_at
            FROM product_variation pv
            JOIN variation v ON v.id = pv.variation_id
            WHERE pv.product_id = $1
            ORDER BY pv.position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let variations = variation_rows
            .iter()
            .map(Self::row_to_variation)
            .collect::<Result<Vec<_>>>()?;
        let variations = self.with_options(variations).await?;

        Ok(Some(ProductDetail {
            in_stock: product.stock_quantity > 0,
            has_variations: !variations.is_empty(),
            product,
            category,
            extras,
            variations,
        }))
    }

    #[tracing::instrument(skip(self, data), fields(slug = %data.slug))]
    async fn insert_product(&self, data: ProductData) -> Result<ProductDetail> {
        let id = EntityId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO product (id, name, slug, description, price, base_price, category_id,
                                 has_stock, stock_quantity, image, ingredients, meta_title,
                                 meta_desc, no_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.description)
        .bind(data.price.cents())
        .bind(data.base_price.cents())
        .bind(data.category_id.as_uuid())
        .bind(data.has_stock)
        .bind(data.stock_quantity)
        .bind(&data.image)
        .bind(&data.ingredients)
        .bind(&data.meta_title)
        .bind(&data.meta_desc)
        .bind(data.no_index)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        Self::replace_product_links(&mut tx, id, &data).await?;
        tx.commit().await?;

        self.load_product_detail(id).await
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_product(
        &self,
        id: EntityId,
        data: ProductData,
    ) -> Result<Option<ProductDetail>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE product
            SET name = $2, slug = $3, description = $4, price = $5, base_price = $6,
                category_id = $7, has_stock = $8, stock_quantity = $9, image = $10,
                ingredients = $11, meta_title = $12, meta_desc = $13, no_index = $14,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.description)
        .bind(data.price.cents())
        .bind(data.base_price.cents())
        .bind(data.category_id.as_uuid())
        .bind(data.has_stock)
        .bind(data.stock_quantity)
        .bind(&data.image)
        .bind(&data.ingredients)
        .bind(&data.meta_title)
        .bind(&data.meta_desc)
        .bind(data.no_index)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::replace_product_links(&mut tx, id, &data).await?;
        tx.commit().await?;

        self.load_product_detail(id).await.map(Some)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_product(&self, id: EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ExtraStore for PostgresStore {
    async fn list_extras(&self) -> Result<Vec<Extra>> {
        let rows = sqlx::query(
            "SELECT id, name, price, created_at, updated_at FROM extra ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_extra).collect()
    }

    async fn get_extra(&self, id: EntityId) -> Result<Option<ExtraDetail>> {
        let Some(row) = sqlx::query(
            "SELECT id, name, price, created_at, updated_at FROM extra WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let extra = Self::row_to_extra(&row)?;

        let product_rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.image
            FROM product_extra pe
            JOIN product p ON p.id = pe.product_id
            WHERE pe.extra_id = $1
            ORDER BY p.name ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let products = product_rows
            .iter()
            .map(Self::row_to_product_ref)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ExtraDetail { extra, products }))
    }

    #[tracing::instrument(skip(self, data))]
    async fn insert_extra(&self, data: ExtraData) -> Result<Extra> {
        let row = sqlx::query(
            r#"
            INSERT INTO extra (id, name, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, created_at, updated_at
            "#,
        )
        .bind(EntityId::new().as_uuid())
        .bind(&data.name)
        .bind(data.price.cents())
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_extra(&row)
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_extra(&self, id: EntityId, data: ExtraData) -> Result<Option<Extra>> {
        let row = sqlx::query(
            r#"
            UPDATE extra SET name = $2, price = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&data.name)
        .bind(data.price.cents())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_extra).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete_extra(&self, id: EntityId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_extra WHERE extra_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM extra WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VariationStore for PostgresStore {
    async fn list_variations(&self) -> Result<Vec<VariationWithOptions>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM variation
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let variations = rows
            .iter()
            .map(Self::row_to_variation)
            .collect::<Result<Vec<_>>>()?;
        self.with_options(variations).await
    }

    async fn get_variation(&self, id: EntityId) -> Result<Option<VariationDetail>> {
        let Some(row) = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM variation WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let variation = Self::row_to_variation(&row)?;
        let options = self.options_for(&[id.as_uuid()]).await?;

        let product_rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.image
            FROM product_variation pv
            JOIN product p ON p.id = pv.product_id
            WHERE pv.variation_id = $1
            ORDER BY p.name ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let products = product_rows
            .iter()
            .map(Self::row_to_product_ref)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(VariationDetail {
            variation,
            options,
            products,
        }))
    }

    #[tracing::instrument(skip(self, data))]
    async fn insert_variation(&self, data: VariationData) -> Result<VariationWithOptions> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO variation (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(EntityId::new().as_uuid())
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await?;
        let variation = Self::row_to_variation(&row)?;

        for (position, option) in data.options.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO variation_option (id, variation_id, name, price, is_default, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(EntityId::new().as_uuid())
            .bind(variation.id.as_uuid())
            .bind(&option.name)
            .bind(option.price.cents())
            .bind(option.is_default)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut loaded = self.with_options(vec![variation]).await?;
        loaded
            .pop()
            .ok_or_else(|| StoreError::InvalidData("inserted variation vanished".to_string()))
    }

    #[tracing::instrument(skip(self, data))]
    async fn update_variation(
        &self,
        id: EntityId,
        data: VariationData,
    ) -> Result<Option<VariationWithOptions>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query(
            r#"
            UPDATE variation SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(&data.name)
        .bind(&data.description)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        let variation = Self::row_to_variation(&row)?;

        let stored: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM variation_option WHERE variation_id = $1")
                .bind(id.as_uuid())
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();
        let keep: Vec<EntityId> = data.options.iter().filter_map(|o| o.id).collect();
        if let Some(foreign) = keep.iter().find(|o| !stored.contains(&o.as_uuid())) {
            return Err(StoreError::not_found("variation option", foreign));
        }

        sqlx::query("DELETE FROM variation_option WHERE variation_id = $1 AND NOT (id = ANY($2))")
            .bind(id.as_uuid())
            .bind(uuids(&keep))
            .execute(&mut *tx)
            .await?;

        for (position, option) in data.options.iter().enumerate() {
            match option.id {
                Some(option_id) => {
                    sqlx::query(
                        r#"
                        UPDATE variation_option
                        SET name = $2, price = $3, is_default = $4, position = $5,
                            updated_at = NOW()
                        WHERE id = $1
                        "#,
                    )
                    .bind(option_id.as_uuid())
                    .bind(&option.name)
                    .bind(option.price.cents())
                    .bind(option.is_default)
                    .bind(position as i32)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO variation_option
                            (id, variation_id, name, price, is_default, position)
                        VALUES ($1, $2, $3, $4, $5, $6)
                        "#,
                    )
                    .bind(EntityId::new().as_uuid())
                    .bind(id.as_uuid())
                    .bind(&option.name)
                    .bind(option.price.cents())
                    .bind(option.is_default)
                    .bind(position as i32)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }
        tx.commit().await?;

        Ok(self.with_options(vec![variation]).await?.pop())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_variation(&self, id: EntityId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM product_variation WHERE variation_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM variation_option WHERE variation_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM variation WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[tracing::instrument(skip(self, order), fields(user_id = %order.user_id, lines = order.items.len()))]
    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetail> {
        let id = EntityId::new();
        let total = order.total();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO customer_order (id, user_id, status, total, address, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(OrderStatus::Pending.as_str())
        .bind(total.cents())
        .bind(&order.address)
        .bind(&order.phone)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        for (position, item) in order.items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                StoreError::InvalidData(format!("quantity {} out of range", item.quantity))
            })?;
            sqlx::query(
                r#"
                INSERT INTO order_item (id, order_id, product_id, product_name, quantity, price, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(EntityId::new().as_uuid())
            .bind(id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(quantity)
            .bind(item.price.cents())
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }
        tx.commit().await?;

        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    async fn get_order(&self, id: EntityId) -> Result<Option<OrderDetail>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1");
        let Some(row) = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let order = Self::row_to_order(&row)?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, price
            FROM order_item
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows
            .iter()
            .map(Self::row_to_order_item)
            .collect::<Result<Vec<_>>>()?;

        let user = self.get_user(order.user_id).await?;

        Ok(Some(OrderDetail { order, items, user }))
    }

    async fn find_order_by_payment(
        &self,
        payment_id: &str,
        method: &str,
    ) -> Result<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE payment_id = $1 AND payment_method = $2"
        );
        let row = sqlx::query(&sql)
            .bind(payment_id)
            .bind(method)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_order).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn set_order_payment(
        &self,
        id: EntityId,
        payment_id: &str,
        method: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customer_order
            SET payment_id = $2, payment_method = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(payment_id)
        .bind(method)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn transition_order_status(
        &self,
        id: EntityId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customer_order
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[tracing::instrument(skip(self, user), fields(role = %user.role))]
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO app_user (id, name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(EntityId::new().as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Self::row_to_user(&row)
    }

    async fn get_user(&self, id: EntityId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at FROM app_user WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM app_user
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl SettingsStore for PostgresStore {
    #[tracing::instrument(skip(self))]
    async fn get_or_create_settings(&self) -> Result<Settings> {
        sqlx::query("INSERT INTO setting (id) VALUES (TRUE) ON CONFLICT (id) DO NOTHING")
            .execute(&self.pool)
            .await?;

        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM setting WHERE id");
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        Self::row_to_settings(&row)
    }

    #[tracing::instrument(skip(self, settings))]
    async fn save_settings(&self, settings: &Settings) -> Result<Settings> {
        let sql = format!(
            r#"
            INSERT INTO setting (id, site_name, logo, favicon, email, phone, address, meta_title,
                                 meta_description, google_login_key, iyzico_key,
                                 iyzico_secret_key, iyzico_sandbox_mode, paytr_key, paytr_salt,
                                 paytr_merchant_id, sms_api_key, sms_api_secret, sms_api_sender,
                                 navbar_color, footer_color, primary_color, secondary_color,
                                 google_analytics_id, google_console_id)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24)
            ON CONFLICT (id) DO UPDATE SET
                site_name = EXCLUDED.site_name,
                logo = EXCLUDED.logo,
                favicon = EXCLUDED.favicon,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                meta_title = EXCLUDED.meta_title,
                meta_description = EXCLUDED.meta_description,
                google_login_key = EXCLUDED.google_login_key,
                iyzico_key = EXCLUDED.iyzico_key,
                iyzico_secret_key = EXCLUDED.iyzico_secret_key,
                iyzico_sandbox_mode = EXCLUDED.iyzico_sandbox_mode,
                paytr_key = EXCLUDED.paytr_key,
                paytr_salt = EXCLUDED.paytr_salt,
                paytr_merchant_id = EXCLUDED.paytr_merchant_id,
                sms_api_key = EXCLUDED.sms_api_key,
                sms_api_secret = EXCLUDED.sms_api_secret,
                sms_api_sender = EXCLUDED.sms_api_sender,
                navbar_color = EXCLUDED.navbar_color,
                footer_color = EXCLUDED.footer_color,
                primary_color = EXCLUDED.primary_color,
                secondary_color = EXCLUDED.secondary_color,
                google_analytics_id = EXCLUDED.google_analytics_id,
                google_console_id = EXCLUDED.google_console_id,
                updated_at = NOW()
            RETURNING {SETTINGS_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&settings.site_name)
            .bind(&settings.logo)
            .bind(&settings.favicon)
            .bind(&settings.email)
            .bind(&settings.phone)
            .bind(&settings.address)
            .bind(&settings.meta_title)
            .bind(&settings.meta_description)
            .bind(&settings.google_login_key)
            .bind(&settings.iyzico_key)
            .bind(&settings.iyzico_secret_key)
            .bind(settings.iyzico_sandbox_mode)
            .bind(&settings.paytr_key)
            .bind(&settings.paytr_salt)
            .bind(&settings.paytr_merchant_id)
            .bind(&settings.sms_api_key)
            .bind(&settings.sms_api_secret)
            .bind(&settings.sms_api_sender)
            .bind(&settings.navbar_color)
            .bind(&settings.footer_color)
            .bind(&settings.primary_color)
            .bind(&settings.secondary_color)
            .bind(&settings.google_analytics_id)
            .bind(&settings.google_console_id)
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_settings(&row)
    }
}
