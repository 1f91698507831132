//! Pure progress derivations over habit history.
//!
//! # Responsibility
//! - Compute streaks, badge unlocks and chart series from canonical habits.
//!
//! # Invariants
//! - Every function here is pure: "today" is always passed in by the caller.

pub mod badges;
pub mod stats;
pub mod streak;
