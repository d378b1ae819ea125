//! Persistence layer for the restaurant backend.
//!
//! The [`Store`] traits describe every read and write the services need.
//! [`PostgresStore`] backs production; [`InMemoryStore`] implements the same
//! contract for tests and for running without a database.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{EntityId, Money};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::*;
pub use postgres::PostgresStore;
pub use store::{
    CategoryStore, ExtraStore, OrderStore, ProductStore, SettingsStore, Store, UserStore,
    VariationStore,
};
