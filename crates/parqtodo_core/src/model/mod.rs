//! Task domain model.
//!
//! # Responsibility
//! - Define the single `Task` entity shared by the engine table and the view.
//! - Own identifier generation strategies.
//!
//! # Invariants
//! - A `TaskId` identifies at most one task across the in-memory list and the
//!   persisted table.
//! - Titles are normalized before they reach any statement.

pub mod id;
pub mod task;
