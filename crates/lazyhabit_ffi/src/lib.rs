//! Flutter bridge for LazyHabit core.
//!
//! Exported functions live in [`api`]; binding code is generated from it.

pub mod api;
