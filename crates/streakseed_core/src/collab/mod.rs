//! Contracts for external collaborators driven by the controller.
//!
//! # Responsibility
//! - Describe authentication, telemetry, notification and clock boundaries.
//! - Ship minimal implementations for hosts that do not provide their own.
//!
//! # Invariants
//! - Collaborator calls are fire-and-forget; none can fail a mutation.

pub mod auth;
pub mod clock;
pub mod notifications;
pub mod telemetry;
