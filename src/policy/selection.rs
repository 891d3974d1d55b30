//! Selection filter: does an update still belong in the catalog?

use std::collections::BTreeSet;

use crate::server::UpdateRecord;

/// True if the update's classification or one of its products is subscribed.
///
/// Deselected updates are deleted outright in the prune phase. Comparison is
/// exact title equality.
pub fn is_selected(
    update: &UpdateRecord,
    subscribed_classifications: &BTreeSet<String>,
    subscribed_categories: &BTreeSet<String>,
) -> bool {
    subscribed_classifications.contains(&update.classification_title)
        || update
            .product_titles
            .iter()
            .any(|p| subscribed_categories.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(titles: &[&str]) -> BTreeSet<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    fn update(classification: &str, products: &[&str]) -> UpdateRecord {
        UpdateRecord {
            classification_title: classification.to_string(),
            product_titles: products.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_selected_by_classification() {
        let u = update("Security Updates", &["Windows XP"]);
        assert!(is_selected(&u, &set(&["Security Updates"]), &set(&["Windows 11"])));
    }

    #[test]
    fn test_selected_by_product() {
        let u = update("Drivers", &["Windows XP", "Windows 11"]);
        assert!(is_selected(&u, &set(&["Security Updates"]), &set(&["Windows 11"])));
    }

    #[test]
    fn test_deselected_when_nothing_overlaps() {
        let u = update("Drivers", &["Windows XP"]);
        assert!(!is_selected(&u, &set(&["Security Updates"]), &set(&["Windows 11"])));
    }

    #[test]
    fn test_comparison_is_exact() {
        let u = update("security updates", &["windows 11"]);
        assert!(!is_selected(&u, &set(&["Security Updates"]), &set(&["Windows 11"])));
    }

    #[test]
    fn test_empty_subscription_selects_nothing() {
        let u = update("Security Updates", &["Windows 11"]);
        assert!(!is_selected(&u, &set(&[]), &set(&[])));
    }
}
