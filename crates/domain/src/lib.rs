//! Business rules for the restaurant backend.
//!
//! Each service wraps a [`store::Store`] and owns the validation for one
//! area:
//! - catalog administration (categories, products, extras, variations)
//! - site settings
//! - accounts and password checks
//! - order placement, pricing and status transitions
//! - the public menu

pub mod catalog;
pub mod error;
pub mod menu;
pub mod order;
pub mod settings;
pub mod user;
pub mod validation;

pub use catalog::{
    CategoryInput, CategoryService, ExtraInput, ExtraService, OptionInput, ProductInput,
    ProductService, VariationInput, VariationService,
};
pub use error::{DomainError, Result};
pub use menu::{Menu, MenuSection, MenuService};
pub use order::{MAX_LINE_QUANTITY, OrderLineInput, OrderService, PlaceOrderInput, unit_price};
pub use settings::{SettingsPatch, SettingsService};
pub use user::{RegistrationInput, UserService};
