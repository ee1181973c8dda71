//! Selection validation against a configurator's compatibility graph.
//!
//! A selection maps each category to at most one chosen option plus a
//! quantity. Before a quote is persisted the selection is validated against
//! the catalog: every selected option must exist, quantities must be
//! positive, required categories must be covered, and no incompatibility or
//! unmet dependency edge may be present among the selected options.
//!
//! Validation is a pure function over in-memory data; the quote handlers load
//! the catalog once and call [`validate_selection`] synchronously before any
//! write happens.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::{CategoryId, OptionId};

/// In-memory view of a category with its options, loaded for validation and
/// pricing.
#[derive(Debug, Clone)]
pub struct CatalogCategory {
    pub id: CategoryId,
    pub name: String,
    pub is_required: bool,
    pub options: Vec<CatalogOption>,
}

/// In-memory view of an option with its outgoing edges.
#[derive(Debug, Clone)]
pub struct CatalogOption {
    pub id: OptionId,
    pub label: String,
    pub price: Decimal,
    /// Symmetric incompatibility edges (stored both ways, so one side suffices
    /// for pair detection)
    pub incompatible_with: Vec<OptionId>,
    /// Directed dependency edges: this option requires each listed option
    pub depends_on: Vec<OptionId>,
}

/// A customer's proposed selection: at most one option per category, with a
/// positive per-category quantity (default 1).
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub selected: HashMap<CategoryId, OptionId>,
    pub quantities: HashMap<CategoryId, i32>,
}

impl Selection {
    pub fn new(selected: HashMap<CategoryId, OptionId>, quantities: HashMap<CategoryId, i32>) -> Self {
        Self { selected, quantities }
    }

    /// Quantity for a category, defaulting to 1 when absent.
    pub fn quantity_for(&self, category: &CategoryId) -> i32 {
        self.quantities.get(category).copied().unwrap_or(1)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Selected option {option} does not belong to category {category}")]
    UnknownOption { category: CategoryId, option: OptionId },

    #[error("Quantity for category {category} must be at least 1 (got {quantity})")]
    InvalidQuantity { category: CategoryId, quantity: i32 },

    #[error("Category '{name}' requires a selection")]
    MissingRequiredCategory { category: CategoryId, name: String },

    #[error("Selected options '{label_a}' and '{label_b}' are incompatible")]
    Incompatible {
        option_a: OptionId,
        option_b: OptionId,
        label_a: String,
        label_b: String,
    },

    #[error("Option '{label}' requires another option that is not selected")]
    MissingDependency {
        option: OptionId,
        required: OptionId,
        label: String,
    },
}

impl SelectionError {
    /// Machine-readable code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::UnknownOption { .. } => "UNKNOWN_OPTION",
            SelectionError::InvalidQuantity { .. } => "INVALID_QUANTITY",
            SelectionError::MissingRequiredCategory { .. } => "MISSING_REQUIRED_CATEGORY",
            SelectionError::Incompatible { .. } => "INCOMPATIBLE_SELECTION",
            SelectionError::MissingDependency { .. } => "MISSING_DEPENDENCY",
        }
    }
}

/// Validate a selection against the catalog.
///
/// Checks run in a deterministic order (category order, then edge order) so
/// the same invalid selection always reports the same first failure:
///
/// 1. every selected option belongs to the category it is keyed under;
/// 2. every selected category's quantity is positive (never clamped);
/// 3. every required category has a selection;
/// 4. no incompatibility edge connects two selected options;
/// 5. every dependency edge from a selected option points at another
///    selected option.
///
/// Edges are not transitively closed: A excluding B and B excluding C implies
/// nothing about A and C.
pub fn validate_selection(categories: &[CatalogCategory], selection: &Selection) -> Result<(), SelectionError> {
    // Resolve each selected option up front; this also rejects stray ids.
    let mut selected_options: Vec<&CatalogOption> = Vec::with_capacity(selection.selected.len());
    for category in categories {
        let Some(option_id) = selection.selected.get(&category.id) else {
            continue;
        };
        let option = category
            .options
            .iter()
            .find(|o| o.id == *option_id)
            .ok_or(SelectionError::UnknownOption {
                category: category.id,
                option: *option_id,
            })?;

        let quantity = selection.quantity_for(&category.id);
        if quantity < 1 {
            return Err(SelectionError::InvalidQuantity {
                category: category.id,
                quantity,
            });
        }

        selected_options.push(option);
    }

    for category in categories {
        if category.is_required && !selection.selected.contains_key(&category.id) {
            return Err(SelectionError::MissingRequiredCategory {
                category: category.id,
                name: category.name.clone(),
            });
        }
    }

    // Pairwise incompatibility check. Edges are stored symmetrically, so
    // checking each option's outgoing list covers every pair.
    let label_of = |id: OptionId| {
        selected_options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.label.clone())
            .unwrap_or_default()
    };
    for option in &selected_options {
        for other in &selected_options {
            if option.id != other.id && option.incompatible_with.contains(&other.id) {
                return Err(SelectionError::Incompatible {
                    option_a: option.id,
                    option_b: other.id,
                    label_a: option.label.clone(),
                    label_b: label_of(other.id),
                });
            }
        }
    }

    for option in &selected_options {
        for required in &option.depends_on {
            if !selected_options.iter().any(|o| o.id == *required) {
                return Err(SelectionError::MissingDependency {
                    option: option.id,
                    required: *required,
                    label: option.label.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn option(id: Uuid, label: &str) -> CatalogOption {
        CatalogOption {
            id,
            label: label.to_string(),
            price: Decimal::new(1000, 2),
            incompatible_with: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    fn category(id: Uuid, name: &str, required: bool, options: Vec<CatalogOption>) -> CatalogCategory {
        CatalogCategory {
            id,
            name: name.to_string(),
            is_required: required,
            options,
        }
    }

    #[test]
    fn test_empty_selection_with_no_required_categories_is_valid() {
        let categories = vec![category(Uuid::new_v4(), "Finish", false, vec![option(Uuid::new_v4(), "Matte")])];
        assert_eq!(validate_selection(&categories, &Selection::default()), Ok(()));
    }

    #[test]
    fn test_incompatible_pair_is_rejected() {
        let cat_a = Uuid::new_v4();
        let cat_b = Uuid::new_v4();
        let opt_a = Uuid::new_v4();
        let opt_b = Uuid::new_v4();

        let mut a = option(opt_a, "Steel frame");
        a.incompatible_with.push(opt_b);
        let mut b = option(opt_b, "Carbon fork");
        b.incompatible_with.push(opt_a);

        let categories = vec![category(cat_a, "Frame", false, vec![a]), category(cat_b, "Fork", false, vec![b])];

        let selection = Selection::new([(cat_a, opt_a), (cat_b, opt_b)].into_iter().collect(), HashMap::new());

        let err = validate_selection(&categories, &selection).unwrap_err();
        assert_eq!(err.code(), "INCOMPATIBLE_SELECTION");
        match err {
            SelectionError::Incompatible { option_a, option_b, .. } => {
                assert!([option_a, option_b].contains(&opt_a));
                assert!([option_a, option_b].contains(&opt_b));
            }
            other => panic!("expected Incompatible, got {other:?}"),
        }
    }

    #[test]
    fn test_incompatibility_is_not_transitive() {
        // A excludes B, B excludes C; selecting A and C together is fine.
        let cats: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let opts: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        let mut a = option(opts[0], "A");
        a.incompatible_with.push(opts[1]);
        let mut b = option(opts[1], "B");
        b.incompatible_with.extend([opts[0], opts[2]]);
        let mut c = option(opts[2], "C");
        c.incompatible_with.push(opts[1]);

        let categories = vec![
            category(cats[0], "First", false, vec![a]),
            category(cats[1], "Second", false, vec![b]),
            category(cats[2], "Third", false, vec![c]),
        ];

        let selection = Selection::new([(cats[0], opts[0]), (cats[2], opts[2])].into_iter().collect(), HashMap::new());
        assert_eq!(validate_selection(&categories, &selection), Ok(()));
    }

    #[test]
    fn test_missing_dependency_is_rejected() {
        let cat_a = Uuid::new_v4();
        let cat_b = Uuid::new_v4();
        let opt_a = Uuid::new_v4();
        let opt_b = Uuid::new_v4();

        let mut a = option(opt_a, "Roof rack");
        a.depends_on.push(opt_b);

        let categories = vec![
            category(cat_a, "Accessories", false, vec![a]),
            category(cat_b, "Roof", false, vec![option(opt_b, "Rail kit")]),
        ];

        let selection = Selection::new([(cat_a, opt_a)].into_iter().collect(), HashMap::new());
        let err = validate_selection(&categories, &selection).unwrap_err();
        assert_eq!(err.code(), "MISSING_DEPENDENCY");

        // Selecting the required option as well satisfies the edge.
        let selection = Selection::new([(cat_a, opt_a), (cat_b, opt_b)].into_iter().collect(), HashMap::new());
        assert_eq!(validate_selection(&categories, &selection), Ok(()));
    }

    #[test]
    fn test_zero_and_negative_quantities_are_rejected() {
        let cat = Uuid::new_v4();
        let opt = Uuid::new_v4();
        let categories = vec![category(cat, "Seats", false, vec![option(opt, "Leather")])];

        for quantity in [0, -3] {
            let selection = Selection::new([(cat, opt)].into_iter().collect(), [(cat, quantity)].into_iter().collect());
            let err = validate_selection(&categories, &selection).unwrap_err();
            assert_eq!(err.code(), "INVALID_QUANTITY");
        }
    }

    #[test]
    fn test_required_category_must_have_selection() {
        let cat = Uuid::new_v4();
        let categories = vec![category(cat, "Base model", true, vec![option(Uuid::new_v4(), "Standard")])];

        let err = validate_selection(&categories, &Selection::default()).unwrap_err();
        assert_eq!(err.code(), "MISSING_REQUIRED_CATEGORY");
    }

    #[test]
    fn test_option_from_wrong_category_is_rejected() {
        let cat_a = Uuid::new_v4();
        let cat_b = Uuid::new_v4();
        let opt_b = Uuid::new_v4();
        let categories = vec![
            category(cat_a, "Color", false, vec![option(Uuid::new_v4(), "Red")]),
            category(cat_b, "Size", false, vec![option(opt_b, "Large")]),
        ];

        // opt_b keyed under cat_a
        let selection = Selection::new([(cat_a, opt_b)].into_iter().collect(), HashMap::new());
        let err = validate_selection(&categories, &selection).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_OPTION");
    }
}
