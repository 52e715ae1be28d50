//! Validation rules for materials, recipes and ingredient lists

use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::min_price_coefficient;
use crate::types::IngredientEntry;

/// Why one entry in an ingredient-list replacement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IngredientEntryError {
    #[error("materialId must be a positive integer")]
    InvalidMaterialId,
    #[error("amount must be a positive integer")]
    InvalidAmount,
    #[error("materialId appears more than once in the list")]
    DuplicateMaterial,
}

/// Validate the shape of an ingredient-list replacement. Returns the index of
/// the first offending entry; the whole call must fail, never part of it.
/// Duplicate material ids are rejected rather than silently collapsed.
pub fn validate_ingredient_entries(
    entries: &[IngredientEntry],
) -> Result<(), (usize, IngredientEntryError)> {
    let mut seen = HashSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if entry.material_id <= 0 {
            return Err((index, IngredientEntryError::InvalidMaterialId));
        }
        if entry.amount <= 0 {
            return Err((index, IngredientEntryError::InvalidAmount));
        }
        if !seen.insert(entry.material_id) {
            return Err((index, IngredientEntryError::DuplicateMaterial));
        }
    }
    Ok(())
}

/// Validate a material or recipe name.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name must not be empty");
    }
    Ok(())
}

/// Validate a recipe category.
pub fn validate_category(category: &str) -> Result<(), &'static str> {
    if category.trim().is_empty() {
        return Err("category must not be empty");
    }
    Ok(())
}

/// Validate a material price (currency units per base quantity).
pub fn validate_price(price: i64) -> Result<(), &'static str> {
    if price < 0 {
        return Err("price must not be negative");
    }
    Ok(())
}

/// Validate a stock quantity.
pub fn validate_stock(stock: i64) -> Result<(), &'static str> {
    if stock < 0 {
        return Err("stock must not be negative");
    }
    Ok(())
}

/// Validate a recipe price coefficient (must be at least 0.1).
pub fn validate_price_coefficient(coefficient: Decimal) -> Result<(), &'static str> {
    if coefficient < min_price_coefficient() {
        return Err("price coefficient must be at least 0.1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(material_id: i64, amount: i64) -> IngredientEntry {
        IngredientEntry {
            material_id,
            amount,
        }
    }

    #[test]
    fn accepts_valid_entries() {
        let entries = [entry(1, 200), entry(2, 50), entry(9, 1)];
        assert!(validate_ingredient_entries(&entries).is_ok());
    }

    #[test]
    fn accepts_empty_list() {
        assert!(validate_ingredient_entries(&[]).is_ok());
    }

    #[test]
    fn rejects_zero_amount_with_index() {
        let entries = [entry(1, 200), entry(2, 50), entry(3, 0), entry(4, 10)];
        assert_eq!(
            validate_ingredient_entries(&entries),
            Err((2, IngredientEntryError::InvalidAmount))
        );
    }

    #[test]
    fn rejects_non_positive_material_id() {
        let entries = [entry(0, 10)];
        assert_eq!(
            validate_ingredient_entries(&entries),
            Err((0, IngredientEntryError::InvalidMaterialId))
        );
        let entries = [entry(-4, 10)];
        assert_eq!(
            validate_ingredient_entries(&entries),
            Err((0, IngredientEntryError::InvalidMaterialId))
        );
    }

    #[test]
    fn rejects_duplicate_material_at_second_occurrence() {
        let entries = [entry(1, 200), entry(2, 50), entry(1, 30)];
        assert_eq!(
            validate_ingredient_entries(&entries),
            Err((2, IngredientEntryError::DuplicateMaterial))
        );
    }

    #[test]
    fn coefficient_boundary() {
        use std::str::FromStr;
        assert!(validate_price_coefficient(Decimal::from_str("0.1").unwrap()).is_ok());
        assert!(validate_price_coefficient(Decimal::from_str("0.09").unwrap()).is_err());
    }

    #[test]
    fn blank_names_rejected() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("شیر پرچرب").is_ok());
    }
}
