//! The Quartermaster delivery dispatcher.
//!
//! A singleton worker process that fulfils pending orders by driving the game's admin console:
//! it polls the ledger on a fixed interval, teleports the admin drone to each buyer, issues the
//! item's spawn commands (or runs the taxi teleport sequence), and records the terminal order
//! state. A database lease guarantees only one instance ever drives the console.

pub mod actuator;
pub mod config;
pub mod errors;
pub mod worker;
