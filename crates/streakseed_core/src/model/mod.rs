//! Habit-tracking domain model.
//!
//! # Responsibility
//! - Define the canonical habit and settings shapes owned by the controller.
//! - Keep the lenient wire shape (`record`) separate from canonical types.
//!
//! # Invariants
//! - Every habit is identified by a stable, client-generated `HabitId`.
//! - Canonical values are only produced through validation or normalization.

pub mod badge;
pub mod habit;
pub mod record;
pub mod settings;
