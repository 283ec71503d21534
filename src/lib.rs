//! # Backlog Core
//!
//! Learning backlog with per-category manual ordering.
//!
//! Items are grouped by owner and category. Within an owner's open items of
//! one category the user controls the order; new items join at the end, and
//! a reorder rewrites the positions of the named items in one atomic batch.
//! The crate ships the domain rules, two storage backends, an HTTP API and
//! a client-side cache that applies drags optimistically and then
//! reconciles with the server.

pub mod api;
pub mod backlog;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use backlog::{Backlog, ReorderOutcome};
pub use domain::{
    BacklogItem, BacklogItemUpdate, Category, ItemFilter, ItemId, NewBacklogItem, OwnerId,
    Priority, SortAssignment,
};
pub use error::{BacklogError, Result};
pub use storage::Storage;
