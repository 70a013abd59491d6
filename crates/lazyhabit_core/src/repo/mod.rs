//! Persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the key-value contract the habit document is stored through.
//! - Isolate SQLite and JSON details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`CorruptDocument`) in addition to
//!   transport errors.

pub mod app_data_repo;
pub mod kv_repo;
