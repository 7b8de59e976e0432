//! Toolkit-independent task list presentation state.
//!
//! # Responsibility
//! - Keep the in-memory task list shown to the user.
//! - Forward intents to a `TaskStore` and reconcile the list with its answers.
//!
//! # Invariants
//! - A failed intent leaves the list exactly as it was before the intent.
//! - Theme is session state and is never persisted.

mod task_list;

pub use task_list::{TaskListView, Theme, ViewStatus, EMPTY_PLACEHOLDER};
