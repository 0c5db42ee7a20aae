//! # procgate-common
//!
//! Shared types and error taxonomy for the procgate gateway.
//!
//! This crate provides the foundational abstractions the other procgate
//! crates build upon: the error taxonomy that maps onto HTTP statuses, and
//! the domain types describing processes held by the external manager.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{Error, Result};
pub use types::{
    ExecutionMode, ManagedProcess, ProcessStatus, ProcessSummary, StartRequest, UpdateOutcome,
};
