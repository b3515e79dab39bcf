//! The Quartermaster admin and bot-facing HTTP server.
//!
//! A thin actix-web surface over [`quartermaster_engine`]: player management, the purchase /
//! taxi / transfer economy endpoints the chat bot calls, catalog CRUD with JSON import/export,
//! and the order status override for admins. Catalog writes are pushed to the chat surface
//! through the [`relay`] client.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod relay;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
