//! # procgate-manager
//!
//! The process-manager boundary: the [`ManagerClient`] / [`ManagerSession`]
//! traits describing the small command surface the gateway needs (connect,
//! disconnect, list, describe, start, stop, restart), the session gateway
//! that guarantees connection release on every exit path, and a concrete
//! backend driving the pm2 CLI.
//!
//! The manager's internal scheduling and respawn behavior is a black box;
//! this crate only speaks its command surface.

pub mod client;
pub mod mock;
pub mod pm2;
pub mod session;

pub use client::{ManagerClient, ManagerSession};
pub use pm2::Pm2Client;
pub use session::with_manager_session;
