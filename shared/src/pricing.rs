//! Pure derived-price math for recipes
//!
//! A recipe's three derived prices are always computable from its ingredient
//! list and the current material prices:
//!
//! - raw price: sum of `material price x amount` over all ingredients
//! - base price: raw price scaled by the recipe's price coefficient
//! - sell price: base price plus the fixed 9% markup
//!
//! Everything here is side-effect free; the backend persists the results as a
//! cache on the recipe row.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Coefficient assigned to recipes created without an explicit one.
pub fn default_price_coefficient() -> Decimal {
    Decimal::new(33, 1) // 3.3
}

/// Smallest coefficient a recipe may carry.
pub fn min_price_coefficient() -> Decimal {
    Decimal::new(1, 1) // 0.1
}

/// Fixed markup applied on top of the coefficient-adjusted price.
pub fn sell_markup_factor() -> Decimal {
    Decimal::new(109, 2) // 1.09
}

/// Cost contribution of one ingredient link at current material prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientCost {
    pub material_price: i64,
    pub amount: i64,
}

/// The three derived prices cached on a recipe row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedPrices {
    pub raw_price: i64,
    pub base_price: i64,
    pub sell_price: i64,
}

impl DerivedPrices {
    pub const ZERO: DerivedPrices = DerivedPrices {
        raw_price: 0,
        base_price: 0,
        sell_price: 0,
    };
}

/// Compute a recipe's derived prices from its ingredient costs and
/// coefficient. Idempotent: the same inputs always yield the same output.
pub fn derive_prices(ingredients: &[IngredientCost], coefficient: Decimal) -> DerivedPrices {
    let raw_price: i64 = ingredients
        .iter()
        .map(|i| i.material_price * i.amount)
        .sum();

    derive_from_raw(raw_price, coefficient)
}

/// Derive the base and sell prices from an already-summed raw price.
pub fn derive_from_raw(raw_price: i64, coefficient: Decimal) -> DerivedPrices {
    let base_price = round_to_i64(Decimal::from(raw_price) * coefficient);
    let sell_price = round_to_i64(Decimal::from(base_price) * sell_markup_factor());

    DerivedPrices {
        raw_price,
        base_price,
        sell_price,
    }
}

/// Round to the nearest integer, halves away from zero.
fn round_to_i64(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn empty_ingredient_list_prices_are_zero() {
        let prices = derive_prices(&[], default_price_coefficient());
        assert_eq!(prices, DerivedPrices::ZERO);
    }

    #[test]
    fn latte_example() {
        // Milk at 15000 per unit, 200 units, coefficient 3.3
        let ingredients = [IngredientCost {
            material_price: 15_000,
            amount: 200,
        }];
        let prices = derive_prices(&ingredients, dec("3.3"));

        assert_eq!(prices.raw_price, 3_000_000);
        assert_eq!(prices.base_price, 9_900_000);
        assert_eq!(prices.sell_price, 10_791_000);
    }

    #[test]
    fn multiple_ingredients_sum() {
        let ingredients = [
            IngredientCost {
                material_price: 1_000,
                amount: 500,
            },
            IngredientCost {
                material_price: 250,
                amount: 40,
            },
        ];
        let prices = derive_prices(&ingredients, dec("2.0"));

        assert_eq!(prices.raw_price, 510_000);
        assert_eq!(prices.base_price, 1_020_000);
        assert_eq!(prices.sell_price, 1_111_800);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        // raw 5 x 0.1 = 0.5 rounds up to 1
        let ingredients = [IngredientCost {
            material_price: 5,
            amount: 1,
        }];
        let prices = derive_prices(&ingredients, dec("0.1"));
        assert_eq!(prices.base_price, 1);
        // 1 x 1.09 = 1.09 rounds down to 1
        assert_eq!(prices.sell_price, 1);
    }

    #[test]
    fn derive_is_idempotent() {
        let ingredients = [
            IngredientCost {
                material_price: 35_000,
                amount: 3,
            },
            IngredientCost {
                material_price: 280_000,
                amount: 1,
            },
        ];
        let first = derive_prices(&ingredients, dec("3.3"));
        let second = derive_prices(&ingredients, dec("3.3"));
        assert_eq!(first, second);
    }
}
