use crate::domain::item::{BacklogItem, Priority};
use std::cmp::Ordering;

/// Canonical listing order for backlog items
///
/// Keys, in order of precedence:
/// 1. incomplete items before completed ones
/// 2. category name ascending
/// 3. manual `sort_order` ascending, items without one last
/// 4. priority descending (high, medium, low)
/// 5. `created_at` descending
/// 6. id ascending
///
/// The last key makes the order total, so any snapshot lists identically
/// every time.
///
/// # Examples
/// ```
/// use backlog_core::domain::sorting::sort_items;
/// use backlog_core::domain::item::{BacklogItem, Category, NewBacklogItem, OwnerId, Priority};
/// use chrono::NaiveDate;
///
/// let owner = OwnerId::new("alice").unwrap();
/// let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
/// let low = Priority::Low;
/// let mut items = vec![
///     BacklogItem::new(owner.clone(), NewBacklogItem::new("B", Category::Books, low, date), 2),
///     BacklogItem::new(owner.clone(), NewBacklogItem::new("A", Category::Books, low, date), 1),
/// ];
///
/// sort_items(&mut items);
/// assert_eq!(items[0].title, "A");
/// ```
pub fn sort_items(items: &mut [BacklogItem]) {
    items.sort_by(compare_items);
}

pub fn compare_items(a: &BacklogItem, b: &BacklogItem) -> Ordering {
    a.is_completed()
        .cmp(&b.is_completed())
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        .then_with(|| compare_sort_order(a.sort_order, b.sort_order))
        .then_with(|| compare_priority(&a.priority, &b.priority).reverse())
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Completed items, most recently completed first
pub fn sort_completed(items: &mut [BacklogItem]) {
    items.sort_by(|a, b| {
        b.completed_at
            .cmp(&a.completed_at)
            .then_with(|| compare_items(a, b))
    });
}

/// Compare manual positions with None always sorting to end
fn compare_sort_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_priority(a: &Priority, b: &Priority) -> Ordering {
    a.rank().cmp(&b.rank())
}
