use qm_common::Coins;
use thiserror::Error;

use crate::{
    db_types::{NewPlayer, Player},
    traits::data_objects::OrderHistoryEntry,
};

#[derive(Debug, Clone, Error)]
pub enum PlayerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No player registered for '{0}'")]
    PlayerNotFound(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for PlayerApiError {
    fn from(e: sqlx::Error) -> Self {
        PlayerApiError::DatabaseError(e.to_string())
    }
}

/// Behaviour for managing player records.
///
/// Players are created on first interaction (`register_player` is an upsert) and are identified
/// everywhere by their chat-platform `external_id`. The [`LedgerDatabase`](crate::traits::LedgerDatabase)
/// trait owns every balance *mutation*; this trait only reads balances, with the single exception
/// of the administrative override in `update_player`.
#[allow(async_fn_in_trait)]
pub trait PlayerManagement {
    /// Create the player on first interaction, or refresh their names if they already exist.
    async fn register_player(&self, player: NewPlayer) -> Result<Player, PlayerApiError>;

    async fn fetch_player(&self, external_id: &str) -> Result<Option<Player>, PlayerApiError>;

    async fn fetch_all_players(&self) -> Result<Vec<Player>, PlayerApiError>;

    /// Administrative override of a player's in-game name and balance.
    async fn update_player(
        &self,
        external_id: &str,
        ingame_name: &str,
        balance: Coins,
    ) -> Result<Player, PlayerApiError>;

    /// Removes the player. Dependent orders are removed by cascade.
    async fn delete_player(&self, external_id: &str) -> Result<(), PlayerApiError>;

    async fn balance_for(&self, external_id: &str) -> Result<Coins, PlayerApiError>;

    /// The player's most recent purchases, newest first.
    async fn order_history(&self, external_id: &str, limit: i64) -> Result<Vec<OrderHistoryEntry>, PlayerApiError>;
}
