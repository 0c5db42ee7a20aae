//! # procgate-server
//!
//! The HTTP surface of the gateway: router and handlers, the API error
//! mapping (NotFound → 404, Validation → 400, Transport → 500), wire
//! types, and YAML configuration.

pub mod api;
pub mod config;
pub mod server;
pub mod types;

pub use api::{create_router, AppState};
pub use config::GatewayConfig;
pub use server::GatewayServer;
