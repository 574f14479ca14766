use std::collections::{BTreeSet, HashSet};

/// SKUs in `known` that are missing from `feed`, in sorted order.
///
/// Reports only. Whether a discontinued SKU is deactivated, flagged, or left
/// alone is decided elsewhere.
#[must_use]
pub fn find_discontinued(
    supplier_name: &str,
    known: &HashSet<String>,
    feed: &HashSet<String>,
) -> BTreeSet<String> {
    let gone: BTreeSet<String> = known.difference(feed).cloned().collect();
    if !gone.is_empty() {
        tracing::info!(
            supplier = %supplier_name,
            count = gone.len(),
            "supplier SKUs missing from current feed"
        );
    }
    gone
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn reports_missing_skus() {
        let gone = find_discontinued("acme", &set(&["A", "B", "C"]), &set(&["A", "B"]));
        assert_eq!(gone.into_iter().collect::<Vec<_>>(), vec!["C"]);
    }

    #[test]
    fn identical_sets_report_nothing() {
        let known = set(&["A", "B", "C"]);
        assert!(find_discontinued("acme", &known, &known.clone()).is_empty());
    }

    #[test]
    fn superset_feed_reports_nothing() {
        let gone = find_discontinued("acme", &set(&["A", "B"]), &set(&["A", "B", "C", "D"]));
        assert!(gone.is_empty());
    }

    #[test]
    fn empty_history_reports_nothing() {
        assert!(find_discontinued("acme", &HashSet::new(), &set(&["A"])).is_empty());
    }
}
