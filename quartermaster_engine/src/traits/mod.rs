//! Interface contracts for Quartermaster database backends.
//!
//! ## Ledger
//! The ledger is the single synchronisation point between the three processes (chat bot, admin
//! server, delivery dispatcher). The [`LedgerDatabase`] trait carries the money-moving operations
//! — purchase authorization, transfers, and the order state machine — all of which must be atomic
//! in the backend.
//!
//! ## Traits
//! * [`LedgerDatabase`] — purchase/transfer authorization and order fulfilment state transitions.
//! * [`PlayerManagement`] — player registration, balances and history queries.
//! * [`CatalogManagement`] — shop item and taxi CRUD, with content validation at write time.
//! * [`AuditManagement`] — administrative audit trail.
mod catalog_management;
mod data_objects;
mod ledger_database;
mod player_management;

pub use catalog_management::{AuditManagement, CatalogApiError, CatalogManagement};
pub use data_objects::{OrderHistoryEntry, OrderQueryFilter, PendingDelivery, PendingTaxiDelivery, TransferOutcome};
pub use ledger_database::{LeaseManagement, LedgerDatabase, LedgerError};
pub use player_management::{PlayerApiError, PlayerManagement};
