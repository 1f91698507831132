//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model, store, sync and collaborators into use-case APIs.
//! - Keep UI and CLI layers decoupled from storage and sync details.

pub mod habit_controller;
pub mod reminder;
