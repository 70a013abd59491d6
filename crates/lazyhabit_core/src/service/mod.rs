//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store reads/writes into use-case level APIs.
//! - Publish the current document to UI-facing subscribers.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod habit_service;
pub mod hub;
pub mod progress;
pub mod rollover;
