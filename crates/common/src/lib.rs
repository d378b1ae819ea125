//! Shared types for the restaurant backend.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::EntityId;
