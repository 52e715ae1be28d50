//! Property-based tests for ingredient-list validation
//!
//! A replacement list is accepted only when every entry has a positive
//! material id, a positive amount, and no material appears twice. Rejections
//! always point at the first offending entry.

use std::collections::HashSet;

use proptest::prelude::*;

use shared::types::IngredientEntry;
use shared::validation::{validate_ingredient_entries, IngredientEntryError};

// ============================================================================
// Strategies
// ============================================================================

fn valid_entry_strategy() -> impl Strategy<Value = IngredientEntry> {
    (1i64..=500, 1i64..=10_000).prop_map(|(material_id, amount)| IngredientEntry {
        material_id,
        amount,
    })
}

/// Lists with unique material ids, always valid
fn valid_entries_strategy() -> impl Strategy<Value = Vec<IngredientEntry>> {
    prop::collection::vec(valid_entry_strategy(), 0..10).prop_map(|entries| {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|e| seen.insert(e.material_id))
            .collect()
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn unique_positive_entries_are_accepted(entries in valid_entries_strategy()) {
        prop_assert!(validate_ingredient_entries(&entries).is_ok());
    }

    #[test]
    fn non_positive_amount_is_rejected_at_its_index(
        entries in valid_entries_strategy(),
        bad_amount in -100i64..=0,
    ) {
        let mut entries = entries;
        let index = entries.len();
        entries.push(IngredientEntry {
            material_id: 100_000, // outside the valid-entry id range
            amount: bad_amount,
        });

        prop_assert_eq!(
            validate_ingredient_entries(&entries),
            Err((index, IngredientEntryError::InvalidAmount))
        );
    }

    #[test]
    fn non_positive_material_id_is_rejected_at_its_index(
        entries in valid_entries_strategy(),
        bad_id in -100i64..=0,
    ) {
        let mut entries = entries;
        let index = entries.len();
        entries.push(IngredientEntry {
            material_id: bad_id,
            amount: 10,
        });

        prop_assert_eq!(
            validate_ingredient_entries(&entries),
            Err((index, IngredientEntryError::InvalidMaterialId))
        );
    }

    #[test]
    fn repeating_any_material_is_rejected(entries in valid_entries_strategy()) {
        prop_assume!(!entries.is_empty());

        let mut entries = entries;
        let duplicate = entries[0];
        let index = entries.len();
        entries.push(duplicate);

        prop_assert_eq!(
            validate_ingredient_entries(&entries),
            Err((index, IngredientEntryError::DuplicateMaterial))
        );
    }

    #[test]
    fn reported_index_is_in_bounds(
        ids in prop::collection::vec(-5i64..=5, 1..10),
        amounts in prop::collection::vec(-5i64..=5, 1..10),
    ) {
        let entries: Vec<IngredientEntry> = ids
            .into_iter()
            .zip(amounts)
            .map(|(material_id, amount)| IngredientEntry {
                material_id,
                amount,
            })
            .collect();

        if let Err((index, _)) = validate_ingredient_entries(&entries) {
            prop_assert!(index < entries.len());
        }
    }
}
