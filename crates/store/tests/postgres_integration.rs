//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use sqlx::PgPool;
use store::{
    CategoryData, CategoryStore, EntityId, ExtraData, ExtraStore, Money, NewOrder, NewOrderItem,
    NewUser, OptionData, OrderStatus, OrderStore, PostgresStore, ProductData, ProductStore, Role,
    SettingsStore, StoreError, UserStore, VariationData, VariationStore,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_schema.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE order_item, customer_order, app_user, product_extra, product_variation, \
         variation_option, variation, extra, product, category, setting",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn category(name: &str, slug: &str) -> CategoryData {
    CategoryData {
        name: name.into(),
        slug: slug.into(),
        is_indexed: true,
        ..Default::default()
    }
}

fn product(category_id: EntityId, name: &str) -> ProductData {
    ProductData {
        name: name.into(),
        slug: name.to_lowercase().replace(' ', "-"),
        description: "Fresh from the grill".into(),
        price: Money::from_cents(18000),
        base_price: Money::zero(),
        category_id,
        has_stock: true,
        stock_quantity: 5,
        image: "/uploads/products/kebap.webp".into(),
        ingredients: vec!["beef".into(), "pepper".into()],
        meta_title: String::new(),
        meta_desc: String::new(),
        no_index: true,
        extra_ids: None,
        variation_ids: vec![],
    }
}

async fn customer(store: &PostgresStore) -> store::User {
    store
        .insert_user(NewUser {
            name: "Elif Kaya".into(),
            email: "elif@example.com".into(),
            password_hash: "$2b$10$hash".into(),
            role: Role::Customer,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn category_slug_is_unique() {
    let store = get_test_store().await;
    store.insert_category(category("Soups", "soups")).await.unwrap();

    let err = store
        .insert_category(category("More soups", "soups"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));
}

#[tokio::test]
async fn category_update_and_lookup_by_slug() {
    let store = get_test_store().await;
    let created = store.insert_category(category("Soups", "soups")).await.unwrap();

    let mut data = category("Hot soups", "hot-soups");
    data.description = Some("Served warm".into());
    let updated = store
        .update_category(created.id, data)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Hot soups");

    let by_slug = store.get_category_by_slug("hot-soups").await.unwrap().unwrap();
    assert_eq!(by_slug.id, created.id);
    assert_eq!(by_slug.description.as_deref(), Some("Served warm"));
}

#[tokio::test]
async fn product_detail_includes_links_in_order() {
    let store = get_test_store().await;
    let mains = store.insert_category(category("Mains", "mains")).await.unwrap();
    let cheese = store
        .insert_extra(ExtraData {
            name: "Cheese".into(),
            price: Money::from_cents(1500),
        })
        .await
        .unwrap();
    let sauce = store
        .insert_extra(ExtraData {
            name: "Sauce".into(),
            price: Money::from_cents(500),
        })
        .await
        .unwrap();
    let size = store
        .insert_variation(VariationData {
            name: "Size".into(),
            description: None,
            options: vec![
                OptionData {
                    id: None,
                    name: "Small".into(),
                    price: Money::zero(),
                    is_default: true,
                },
                OptionData {
                    id: None,
                    name: "Large".into(),
                    price: Money::from_cents(4000),
                    is_default: false,
                },
            ],
        })
        .await
        .unwrap();

    let mut data = product(mains.id, "Iskender");
    data.price = Money::zero();
    data.base_price = Money::from_cents(30000);
    data.extra_ids = Some(vec![sauce.id, cheese.id]);
    data.variation_ids = vec![size.variation.id];
    let created = store.insert_product(data).await.unwrap();

    assert!(created.has_variations);
    assert!(created.in_stock);
    assert_eq!(created.category.as_ref().unwrap().name, "Mains");
    let extras: Vec<_> = created.extras.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(extras, vec!["Sauce", "Cheese"]);
    let options: Vec<_> = created.variations[0]
        .options
        .iter()
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(options, vec!["Small", "Large"]);

    let listed = store.list_products().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].variations[0].option_count, 2);
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let store = get_test_store().await;
    let err = store
        .insert_product(product(EntityId::new(), "Ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "category", .. }));
}

#[tokio::test]
async fn deleting_product_keeps_order_history() {
    let store = get_test_store().await;
    let mains = store.insert_category(category("Mains", "mains")).await.unwrap();
    let kebap = store
        .insert_product(product(mains.id, "Adana"))
        .await
        .unwrap();
    let user = customer(&store).await;

    let order = store
        .insert_order(NewOrder {
            user_id: user.id,
            address: Some("Kadıköy".into()),
            phone: None,
            items: vec![NewOrderItem {
                product_id: kebap.product.id,
                product_name: "Adana".into(),
                quantity: 2,
                price: Money::from_cents(18000),
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.order.total, Money::from_cents(36000));

    assert!(store.delete_product(kebap.product.id).await.unwrap());

    let reloaded = store.get_order(order.order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.items[0].product_id, None);
    assert_eq!(reloaded.items[0].product_name, "Adana");
}

#[tokio::test]
async fn variation_update_rejects_foreign_option() {
    let store = get_test_store().await;
    let first = store
        .insert_variation(VariationData {
            name: "Size".into(),
            description: None,
            options: vec![OptionData {
                id: None,
                name: "Small".into(),
                price: Money::zero(),
                is_default: true,
            }],
        })
        .await
        .unwrap();
    let second = store
        .insert_variation(VariationData {
            name: "Spice".into(),
            description: None,
            options: vec![OptionData {
                id: None,
                name: "Mild".into(),
                price: Money::zero(),
                is_default: true,
            }],
        })
        .await
        .unwrap();

    let err = store
        .update_variation(
            first.variation.id,
            VariationData {
                name: "Size".into(),
                description: None,
                options: vec![OptionData {
                    id: Some(second.options[0].id),
                    name: "Stolen".into(),
                    price: Money::zero(),
                    is_default: true,
                }],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let untouched = store.get_variation(second.variation.id).await.unwrap().unwrap();
    assert_eq!(untouched.options[0].name, "Mild");
}

#[tokio::test]
async fn payment_token_lookup_and_status_transition() {
    let store = get_test_store().await;
    let mains = store.insert_category(category("Mains", "mains")).await.unwrap();
    let kebap = store.insert_product(product(mains.id, "Urfa")).await.unwrap();
    let user = customer(&store).await;
    let order = store
        .insert_order(NewOrder {
            user_id: user.id,
            address: None,
            phone: None,
            items: vec![NewOrderItem {
                product_id: kebap.product.id,
                product_name: "Urfa".into(),
                quantity: 1,
                price: Money::from_cents(18000),
            }],
        })
        .await
        .unwrap();
    let id = order.order.id;

    assert!(store.set_order_payment(id, "tok-123", "IYZICO").await.unwrap());
    let found = store
        .find_order_by_payment("tok-123", "IYZICO")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
    assert!(
        store
            .find_order_by_payment("tok-123", "PAYTR")
            .await
            .unwrap()
            .is_none()
    );

    assert!(
        store
            .transition_order_status(id, OrderStatus::Pending, OrderStatus::Processing)
            .await
            .unwrap()
    );
    assert!(
        !store
            .transition_order_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn user_email_unique_ignoring_case() {
    let store = get_test_store().await;
    customer(&store).await;

    let err = store
        .insert_user(NewUser {
            name: "Someone".into(),
            email: "ELIF@example.com".into(),
            password_hash: "x".into(),
            role: Role::Customer,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { .. }));

    let found = store.get_user_by_email("Elif@Example.com").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn settings_singleton_round_trip() {
    let store = get_test_store().await;
    let created = store.get_or_create_settings().await.unwrap();
    assert_eq!(created.site_name, "RestoranX");

    let mut changed = created.clone();
    changed.site_name = "Kebapçı".into();
    changed.iyzico_sandbox_mode = true;
    store.save_settings(&changed).await.unwrap();

    let reloaded = store.get_or_create_settings().await.unwrap();
    assert_eq!(reloaded.site_name, "Kebapçı");
    assert!(reloaded.iyzico_sandbox_mode);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM setting")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settings_creation_yields_one_row() {
    let store = get_test_store().await;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..16 {
        let store = store.clone();
        tasks.spawn(async move { store.get_or_create_settings().await });
    }
    let mut rows = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        rows.push(joined.unwrap().unwrap());
    }

    assert_eq!(rows.len(), 16);
    assert!(rows.iter().all(|row| *row == rows[0]));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM setting")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}
