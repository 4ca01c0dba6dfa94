//! Shared types for the feedback board: view models plus the form schemas
//! and the rules that check them. Nothing in this crate touches storage.

pub mod forms;
pub mod models;
pub mod validation;
