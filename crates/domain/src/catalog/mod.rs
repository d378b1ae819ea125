//! Admin-managed catalog: categories, products, extras and variations.

mod category;
mod extra;
mod product;
mod variation;

pub use category::{CategoryInput, CategoryService};
pub use extra::{ExtraInput, ExtraService};
pub use product::{ProductInput, ProductService};
pub use variation::{OptionInput, VariationInput, VariationService};
