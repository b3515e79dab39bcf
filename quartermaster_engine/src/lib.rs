//! Quartermaster Engine
//!
//! The Quartermaster engine is the core of a virtual game-economy service: players hold coin
//! balances, spend them on catalog items and taxi rides, and a delivery dispatcher drives the
//! resulting orders into the game's admin console. This library contains the core logic and is
//! surface-agnostic; the chat bot, the admin server and the dispatcher are all thin clients of it.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database, which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality: purchase
//!    and transfer authorization, the order state machine, catalog management, and the
//!    dispatcher's work queue. Backends implement the traits in [`mod@traits`] to power these
//!    APIs.
//!
//! The engine also provides a set of events that can be subscribed to. These are emitted when
//! orders are created, delivered or failed, so that the chat surface can notify players without
//! the engine knowing anything about chat platforms.
pub mod api;
pub mod commands;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{CatalogApi, CatalogExport, DispatchApi, OrderFlowApi, PlayerApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AuditManagement,
    CatalogApiError,
    CatalogManagement,
    LeaseManagement,
    LedgerDatabase,
    LedgerError,
    PlayerApiError,
    PlayerManagement,
};
