//! Display-side derivations over a cached item list.
//!
//! Nothing here is written back to the server.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{sort_completed, BacklogItem, Category};

/// An open item whose tentative start date has already passed
pub fn is_overdue(item: &BacklogItem, today: NaiveDate) -> bool {
    !item.is_completed() && item.tentative_start_date < today
}

/// Shows overdue items as completed at `now`
pub fn process_overdue(
    items: &[BacklogItem],
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<BacklogItem> {
    items
        .iter()
        .map(|item| {
            let mut item = item.clone();
            if is_overdue(&item, today) {
                item.completed_at = Some(now);
            }
            item
        })
        .collect()
}

/// Open items of one category, in cached order
pub fn by_category(items: &[BacklogItem], category: Category) -> Vec<BacklogItem> {
    items
        .iter()
        .filter(|item| item.category == category && !item.is_completed())
        .cloned()
        .collect()
}

/// Completed items, newest completion first
pub fn completed(items: &[BacklogItem]) -> Vec<BacklogItem> {
    let mut done: Vec<BacklogItem> = items
        .iter()
        .filter(|item| item.is_completed())
        .cloned()
        .collect();
    sort_completed(&mut done);
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewBacklogItem, OwnerId, Priority};
    use chrono::Duration;

    fn item(title: &str, category: Category, start: NaiveDate) -> BacklogItem {
        let data = NewBacklogItem::new(title, category, Priority::Medium, start);
        BacklogItem::new(OwnerId::new("alice").unwrap(), data, 1)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_overdue() {
        let today = day(2025, 3, 15);
        assert!(is_overdue(&item("past", Category::Books, day(2025, 3, 14)), today));
        assert!(!is_overdue(&item("today", Category::Books, today), today));
        assert!(!is_overdue(&item("future", Category::Books, day(2025, 4, 1)), today));

        let mut done = item("done", Category::Books, day(2020, 1, 1));
        done.complete();
        assert!(!is_overdue(&done, today));
    }

    #[test]
    fn test_process_overdue_marks_only_past_items() {
        let today = day(2025, 3, 15);
        let now = Utc::now();
        let items = vec![
            item("past", Category::Books, day(2025, 1, 1)),
            item("future", Category::Books, day(2025, 6, 1)),
        ];

        let processed = process_overdue(&items, today, now);
        assert_eq!(processed[0].completed_at, Some(now));
        assert!(processed[1].completed_at.is_none());
        assert!(items[0].completed_at.is_none());
    }

    #[test]
    fn test_by_category_and_completed() {
        let start = day(2025, 6, 1);
        let mut older = item("older", Category::Books, start);
        older.completed_at = Some(Utc::now() - Duration::days(3));
        let mut newer = item("newer", Category::Udemy, start);
        newer.completed_at = Some(Utc::now());
        let open = item("open", Category::Books, start);

        let items = vec![older, open, newer];

        let books = by_category(&items, Category::Books);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "open");

        let done: Vec<_> = completed(&items).into_iter().map(|i| i.title).collect();
        assert_eq!(done, vec!["newer", "older"]);
    }
}
