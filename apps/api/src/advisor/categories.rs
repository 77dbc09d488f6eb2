use serde::Serialize;

/// Category labels that switch a query to the multi-result branch.
pub const PRODUCT_CATEGORIES: [&str; 15] = [
    "Dog Food",
    "Treats",
    "Toys",
    "Dental Chews",
    "Grooming Supplies",
    "Beds",
    "Collars",
    "Leashes",
    "Training Equipment",
    "Supplements",
    "Medications",
    "Bowls",
    "Crates",
    "Clothing",
    "Accessories",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Score one named product.
    Product,
    /// Recommend several products within a category.
    Category,
}

/// Case-insensitive exact match against `PRODUCT_CATEGORIES`.
pub fn canonical_category(query: &str) -> Option<&'static str> {
    let query = query.trim();
    PRODUCT_CATEGORIES
        .iter()
        .copied()
        .find(|category| category.eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_match_is_case_insensitive() {
        assert_eq!(canonical_category("dog food"), Some("Dog Food"));
        assert_eq!(canonical_category("  TOYS "), Some("Toys"));
        assert_eq!(canonical_category("dental chews"), Some("Dental Chews"));
    }

    #[test]
    fn test_partial_match_is_a_product() {
        assert_eq!(canonical_category("Dog Food Bowl"), None);
        assert_eq!(canonical_category("toy"), None);
        assert_eq!(canonical_category("Purina Pro Plan Adult"), None);
    }

    #[test]
    fn test_categories_are_unique() {
        for (i, a) in PRODUCT_CATEGORIES.iter().enumerate() {
            for b in &PRODUCT_CATEGORIES[i + 1..] {
                assert!(!a.eq_ignore_ascii_case(b), "duplicate category {a}");
            }
        }
    }
}
