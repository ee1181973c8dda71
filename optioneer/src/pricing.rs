//! Deterministic quote pricing.
//!
//! The total for a selection is `Σ option.price × quantity` over every
//! category with a selection. All accumulation happens in
//! [`rust_decimal::Decimal`]; nothing is converted to a float mid-computation.
//! The only floating/display boundary is [`format_price`], which renders the
//! final figure with the configurator's currency symbol.

use rust_decimal::Decimal;

use crate::selection::{CatalogCategory, Selection};

/// Compute the total price for a selection.
///
/// Categories without a selection contribute nothing, regardless of any
/// quantity entry they may carry. Quantities default to 1. The caller is
/// expected to have run [`crate::selection::validate_selection`] first, so
/// unknown option ids are simply skipped here rather than re-reported.
pub fn evaluate_total(categories: &[CatalogCategory], selection: &Selection) -> Decimal {
    let mut total = Decimal::ZERO;

    for category in categories {
        let Some(option_id) = selection.selected.get(&category.id) else {
            continue;
        };
        let Some(option) = category.options.iter().find(|o| o.id == *option_id) else {
            continue;
        };

        let quantity = selection.quantity_for(&category.id).max(1);
        total += option.price * Decimal::from(quantity);
    }

    total
}

/// Format a price for display with the configurator's currency symbol.
///
/// A zero total renders with full currency formatting, not an empty string.
pub fn format_price(amount: Decimal, symbol: &str) -> String {
    format!("{symbol}{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::CatalogOption;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn catalog() -> (Vec<CatalogCategory>, Vec<Uuid>, Vec<Uuid>) {
        let cat_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let opt_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let prices = ["19.99", "0.00", "125.50"];

        let categories = cat_ids
            .iter()
            .zip(opt_ids.iter())
            .zip(prices.iter())
            .map(|((cat, opt), price)| CatalogCategory {
                id: *cat,
                name: "Category".to_string(),
                is_required: false,
                options: vec![CatalogOption {
                    id: *opt,
                    label: "Option".to_string(),
                    price: Decimal::from_str_exact(price).unwrap(),
                    incompatible_with: Vec::new(),
                    depends_on: Vec::new(),
                }],
            })
            .collect();

        (categories, cat_ids, opt_ids)
    }

    #[test]
    fn test_empty_selection_totals_zero() {
        let (categories, _, _) = catalog();
        assert_eq!(evaluate_total(&categories, &Selection::default()), Decimal::ZERO);
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let (categories, cats, opts) = catalog();
        let selection = Selection::new(
            [(cats[0], opts[0]), (cats[2], opts[2])].into_iter().collect(),
            [(cats[0], 3)].into_iter().collect(),
        );

        // 3 × 19.99 + 1 × 125.50
        let expected = Decimal::from_str_exact("185.47").unwrap();
        assert_eq!(evaluate_total(&categories, &selection), expected);
    }

    #[test]
    fn test_unselected_category_quantity_has_no_effect() {
        let (categories, cats, opts) = catalog();

        let base = Selection::new([(cats[0], opts[0])].into_iter().collect(), HashMap::new());
        let with_stray_quantity = Selection::new(
            [(cats[0], opts[0])].into_iter().collect(),
            [(cats[2], 99)].into_iter().collect(),
        );

        assert_eq!(
            evaluate_total(&categories, &base),
            evaluate_total(&categories, &with_stray_quantity)
        );
    }

    #[test]
    fn test_decimal_accumulation_has_no_float_drift() {
        // 0.10 summed ten times must be exactly 1.00
        let cat = Uuid::new_v4();
        let opt = Uuid::new_v4();
        let categories = vec![CatalogCategory {
            id: cat,
            name: "Trim".to_string(),
            is_required: false,
            options: vec![CatalogOption {
                id: opt,
                label: "Strip".to_string(),
                price: Decimal::from_str_exact("0.10").unwrap(),
                incompatible_with: Vec::new(),
                depends_on: Vec::new(),
            }],
        }];
        let selection = Selection::new([(cat, opt)].into_iter().collect(), [(cat, 10)].into_iter().collect());

        assert_eq!(evaluate_total(&categories, &selection), Decimal::from_str_exact("1.00").unwrap());
    }

    #[test]
    fn test_zero_price_formats_with_full_currency() {
        assert_eq!(format_price(Decimal::ZERO, "$"), "$0.00");
        assert_eq!(format_price(Decimal::ZERO, "€"), "€0.00");
    }

    #[test]
    fn test_format_price_rounds_to_cents() {
        assert_eq!(format_price(Decimal::from_str_exact("185.475").unwrap(), "$"), "$185.48");
        assert_eq!(format_price(Decimal::from_str_exact("7").unwrap(), "£"), "£7.00");
    }
}
