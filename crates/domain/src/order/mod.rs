//! Customer orders.
//!
//! Orders are created `Pending` with fully priced lines; payment resolution
//! moves them on through compare-and-set status transitions.

pub mod pricing;
mod service;

pub use pricing::unit_price;
pub use service::{MAX_LINE_QUANTITY, OrderLineInput, OrderService, PlaceOrderInput};
