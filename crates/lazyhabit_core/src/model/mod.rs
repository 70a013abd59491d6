//! Habit domain model.
//!
//! # Responsibility
//! - Define the habit, track and root document shapes used by core logic.
//! - Own the pure mutation functions and the JSON wire format.
//!
//! # Invariants
//! - Every habit is identified by a stable `HabitId`.
//! - Habits are the in-memory source of truth; track records only add dates.

pub mod app_data;
pub mod habit;
