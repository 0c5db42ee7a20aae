//! # procgate-ops
//!
//! The orchestration core sitting between an inbound request and the
//! process-manager / version-control calls: identifier resolution, the
//! seven dispatch operations, and the multi-stage update workflow.

pub mod dispatch;
pub mod resolve;
pub mod update;

pub use dispatch::{parse_lines, RestartReceipt, DEFAULT_LOG_LINES};
pub use resolve::Resolution;
pub use update::{UpdateError, LOG_FAILURE_PLACEHOLDER};
