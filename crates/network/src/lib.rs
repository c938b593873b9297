//! Network-level views and trade composition.
//!
//! This crate provides:
//! - [`NetworkInfo`], a read-only facade answering quote and withdrawal
//!   readiness queries
//! - Explicit two-hop route composition through the network token
//! - An all-or-nothing route execution helper for orchestrators

/// Read-only facade.
pub mod info;
/// Trade routes.
pub mod route;

pub use info::{NetworkInfo, NetworkInfoBuilder};
pub use route::{RouteQuote, TradeRoute, compose_by_source, compose_by_target, execute_route};
