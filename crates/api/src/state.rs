//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use domain::{
    CategoryService, ExtraService, MenuService, OrderService, ProductService, SettingsService,
    UserService, VariationService,
};
use payment::{CheckoutService, PaymentGateway};
use store::Store;

use crate::auth::SessionKeys;
use crate::config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub categories: CategoryService<S>,
    pub products: ProductService<S>,
    pub extras: ExtraService<S>,
    pub variations: VariationService<S>,
    pub settings: SettingsService<S>,
    pub users: UserService<S>,
    pub orders: OrderService<S>,
    pub menu: MenuService<S>,
    pub checkout: CheckoutService<S>,
    pub sessions: SessionKeys,
    pub upload_dir: PathBuf,
    pub allow_admin_bootstrap: bool,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(
        store: S,
        gateway: Arc<dyn PaymentGateway>,
        sessions: SessionKeys,
        config: &Config,
    ) -> Self {
        Self {
            categories: CategoryService::new(store.clone()),
            products: ProductService::new(store.clone()),
            extras: ExtraService::new(store.clone()),
            variations: VariationService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            users: UserService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            menu: MenuService::new(store.clone()),
            checkout: CheckoutService::new(store, gateway, config.app_url.clone()),
            sessions,
            upload_dir: config.upload_dir.clone(),
            allow_admin_bootstrap: config.allow_admin_bootstrap,
        }
    }
}

impl<S: Store> FromRef<Arc<AppState<S>>> for SessionKeys {
    fn from_ref(state: &Arc<AppState<S>>) -> Self {
        state.sessions.clone()
    }
}
