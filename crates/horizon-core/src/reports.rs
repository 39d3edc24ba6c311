//! Report structures for API responses

use horizon_utils::{count_categories, CategoryCount};
use serde::Serialize;

use crate::models::Transaction;

/// Category counts over a transaction feed, most frequent first
pub fn count_transaction_categories(transactions: &[Transaction]) -> Vec<CategoryCount> {
    count_categories(transactions.iter().map(|t| t.category.as_str()))
}

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

/// Slice `items` into the 1-based `page` of `per_page` entries.
///
/// Page 0 is treated as page 1; pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page);
    let page_items = items
        .iter()
        .skip(start)
        .take(per_page)
        .cloned()
        .collect();

    Page {
        items: page_items,
        page,
        per_page,
        total_count,
        total_pages,
    }
}

impl<T> Page<T> {
    /// Replace every item while keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::normalize_synced;
    use horizon_gateway::sandbox::sandbox_transactions;

    fn feed() -> Vec<Transaction> {
        sandbox_transactions().into_iter().map(normalize_synced).collect()
    }

    #[test]
    fn test_category_counts_over_feed() {
        let counts = count_transaction_categories(&feed());

        assert_eq!(counts[0].name, "Shopping");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].name, "Entertainment");
        assert_eq!(counts.len(), 5);
        assert!(counts.iter().all(|c| c.total_count == 7));
    }

    #[test]
    fn test_paginate() {
        let numbers: Vec<u32> = (1..=23).collect();

        let first = paginate(&numbers, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);

        let last = paginate(&numbers, 3, 10);
        assert_eq!(last.items, vec![21, 22, 23]);

        assert!(paginate(&numbers, 4, 10).items.is_empty());
        assert_eq!(paginate(&numbers, 0, 10).page, 1);
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = paginate(&[1, 2, 3], 2, 2).map(|n| n * 10);
        assert_eq!(page.items, vec![30]);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);
    }
}
