//! Unified API for accessing player records.

use std::fmt::Debug;

use qm_common::Coins;

use crate::{
    db_types::{NewPlayer, Player},
    traits::{OrderHistoryEntry, PlayerApiError, PlayerManagement},
};

/// The `PlayerApi` provides a unified API for accessing player records.
pub struct PlayerApi<B> {
    db: B,
}

impl<B: Debug> Debug for PlayerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PlayerApi ({:?})", self.db)
    }
}

impl<B> PlayerApi<B>
where B: PlayerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates the player on first interaction, or refreshes their names if they already exist.
    pub async fn register(&self, player: NewPlayer) -> Result<Player, PlayerApiError> {
        self.db.register_player(player).await
    }

    pub async fn player(&self, external_id: &str) -> Result<Option<Player>, PlayerApiError> {
        self.db.fetch_player(external_id).await
    }

    pub async fn all_players(&self) -> Result<Vec<Player>, PlayerApiError> {
        self.db.fetch_all_players().await
    }

    pub async fn update(&self, external_id: &str, ingame_name: &str, balance: Coins) -> Result<Player, PlayerApiError> {
        self.db.update_player(external_id, ingame_name, balance).await
    }

    pub async fn delete(&self, external_id: &str) -> Result<(), PlayerApiError> {
        self.db.delete_player(external_id).await
    }

    pub async fn balance(&self, external_id: &str) -> Result<Coins, PlayerApiError> {
        self.db.balance_for(external_id).await
    }

    pub async fn history(&self, external_id: &str, limit: i64) -> Result<Vec<OrderHistoryEntry>, PlayerApiError> {
        self.db.order_history(external_id, limit).await
    }
}
