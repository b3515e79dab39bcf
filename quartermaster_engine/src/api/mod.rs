//! # Quartermaster engine public API
//!
//! The `api` module exposes the programmatic API for the Quartermaster engine.
//! The API is modular, so that clients can pick and choose the functionality they want: the chat
//! bot only needs [`order_flow_api`] and [`player_api`], the dispatcher only [`dispatch_api`],
//! and the admin server all four.
//!
//! * [`order_flow_api`] is the primary API for authorizing purchases, taxi rides and transfers.
//! * [`dispatch_api`] is the dispatcher's view: pending work, completion, and the singleton lease.
//! * [`player_api`] manages player records, balances and purchase history.
//! * [`catalog_api`] manages the shop item and taxi catalog, including JSON import/export.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same. An API instance is created by supplying a database
//! backend that implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use quartermaster_engine::{PlayerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/quartermaster.db", 5).await?;
//! // SqliteDatabase implements PlayerManagement
//! let api = PlayerApi::new(db);
//! let balance = api.balance("discord:1234").await?;
//! ```

pub mod catalog_api;
pub mod dispatch_api;
pub mod order_flow_api;
pub mod player_api;

pub use catalog_api::{CatalogApi, CatalogExport};
pub use dispatch_api::DispatchApi;
pub use order_flow_api::OrderFlowApi;
pub use player_api::PlayerApi;
