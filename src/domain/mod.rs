pub mod item;
pub mod ordering;
pub mod sorting;

pub use item::{
    BacklogItem, BacklogItemUpdate, Category, ItemFilter, ItemId, NewBacklogItem, OwnerId,
    Priority,
};
pub use ordering::{next_sort_order, plan_reorder, SortAssignment};
pub use sorting::{compare_items, sort_completed, sort_items};
