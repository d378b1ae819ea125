//! Unit price calculation for a configured product.

use common::{EntityId, Money};
use store::ProductDetail;

use crate::error::{DomainError, Result};

/// Computes the unit price of `product` with the chosen options and extras.
///
/// Single-price products cost `price`. Variation-priced products cost
/// `base_price` plus one option delta per variation; a variation without a
/// chosen option contributes its default option. Extras must be attached to
/// the product and are each added once.
pub fn unit_price(
    product: &ProductDetail,
    option_ids: &[EntityId],
    extra_ids: &[EntityId],
) -> Result<Money> {
    let mut total = if product.has_variations {
        product.product.base_price
    } else {
        product.product.price
    };

    let mut matched = 0;
    for variation in &product.variations {
        let chosen: Vec<_> = variation
            .options
            .iter()
            .filter(|o| option_ids.contains(&o.id))
            .collect();
        matched += chosen.len();

        let option = match chosen.as_slice() {
            [] => variation.default_option(),
            [one] => Some(*one),
            _ => {
                return Err(DomainError::validation(format!(
                    "Choose only one option for {}",
                    variation.variation.name
                )));
            }
        };
        if let Some(option) = option {
            total += option.price;
        }
    }
    if matched != count_unique(option_ids) {
        return Err(DomainError::validation(format!(
            "Unknown option selected for {}",
            product.product.name
        )));
    }

    let mut seen = Vec::with_capacity(extra_ids.len());
    for id in extra_ids {
        if seen.contains(id) {
            continue;
        }
        seen.push(*id);
        let extra = product
            .extras
            .iter()
            .find(|e| e.id == *id)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "Extra {id} is not available for {}",
                    product.product.name
                ))
            })?;
        total += extra.price;
    }

    Ok(total)
}

fn count_unique(ids: &[EntityId]) -> usize {
    let mut unique: Vec<&EntityId> = ids.iter().collect();
    unique.sort();
    unique.dedup();
    unique.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use store::{Extra, Product, Variation, VariationOption, VariationWithOptions};

    fn product(price: i64, base_price: i64) -> Product {
        Product {
            id: EntityId::new(),
            name: "Pizza".into(),
            slug: "pizza".into(),
            description: String::new(),
            price: Money::from_cents(price),
            base_price: Money::from_cents(base_price),
            category_id: EntityId::new(),
            has_stock: false,
            stock_quantity: 0,
            image: String::new(),
            ingredients: vec![],
            meta_title: String::new(),
            meta_desc: String::new(),
            no_index: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variation(name: &str, options: &[(&str, i64, bool)]) -> VariationWithOptions {
        let id = EntityId::new();
        VariationWithOptions {
            variation: Variation {
                id,
                name: name.into(),
                description: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            options: options
                .iter()
                .map(|(name, cents, is_default)| VariationOption {
                    id: EntityId::new(),
                    variation_id: id,
                    name: (*name).into(),
                    price: Money::from_cents(*cents),
                    is_default: *is_default,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .collect(),
        }
    }

    fn extra(cents: i64) -> Extra {
        Extra {
            id: EntityId::new(),
            name: "Cheese".into(),
            price: Money::from_cents(cents),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn detail(product: Product, variations: Vec<VariationWithOptions>, extras: Vec<Extra>) -> ProductDetail {
        ProductDetail {
            in_stock: false,
            has_variations: !variations.is_empty(),
            category: None,
            product,
            extras,
            variations,
        }
    }

    #[test]
    fn simple_product_uses_price() {
        let p = detail(product(12000, 0), vec![], vec![]);
        assert_eq!(unit_price(&p, &[], &[]).unwrap(), Money::from_cents(12000));
    }

    #[test]
    fn variation_product_adds_chosen_and_default_deltas() {
        let size = variation("Size", &[("Small", 0, false), ("Large", 4000, true)]);
        let crust = variation("Crust", &[("Thin", 0, true), ("Stuffed", 2500, false)]);
        let stuffed = crust.options[1].id;
        let p = detail(product(0, 20000), vec![size, crust], vec![]);

        // Size falls back to its default (Large), crust is chosen.
        assert_eq!(
            unit_price(&p, &[stuffed], &[]).unwrap(),
            Money::from_cents(20000 + 4000 + 2500)
        );
    }

    #[test]
    fn two_options_of_one_variation_rejected() {
        let size = variation("Size", &[("Small", 0, true), ("Large", 4000, false)]);
        let ids = [size.options[0].id, size.options[1].id];
        let p = detail(product(0, 20000), vec![size], vec![]);
        assert!(unit_price(&p, &ids, &[]).is_err());
    }

    #[test]
    fn foreign_option_rejected() {
        let size = variation("Size", &[("Small", 0, true)]);
        let p = detail(product(0, 20000), vec![size], vec![]);
        assert!(unit_price(&p, &[EntityId::new()], &[]).is_err());
    }

    #[test]
    fn extras_added_once_and_must_belong() {
        let cheese = extra(1500);
        let cheese_id = cheese.id;
        let p = detail(product(10000, 0), vec![], vec![cheese]);

        assert_eq!(
            unit_price(&p, &[], &[cheese_id, cheese_id]).unwrap(),
            Money::from_cents(11500)
        );
        assert!(unit_price(&p, &[], &[EntityId::new()]).is_err());
    }
}
