use std::{path::Path, sync::Arc};

use tokio::sync::RwLock;
use tracing::log;

use crate::{db::{next_id, Db, DbError}, models::Collection, models_api::player::{ApiPlayer, ApiPlayerInfo, NewPlayer}};

pub struct PlayerService {
    db: Db<Collection, Vec<ApiPlayer>>,
}
pub type SafePlayerService = Arc<RwLock<PlayerService>>;

impl PlayerService {
    pub fn new(root: impl AsRef<Path>) -> SafePlayerService {
        Arc::new(RwLock::new(PlayerService { db: Db::new(root) }))
    }

    pub fn read_info(&self) -> Result<Vec<ApiPlayerInfo>, DbError> {
        let players = self.db.read_or_default(&Collection::PlayerInfo)?;
        Ok(players.iter().map(ApiPlayerInfo::from).collect())
    }

    /// Appends the player with the next id. Callers hold the write lock so
    /// concurrent creates never hand out the same id.
    pub fn create(&mut self, new_player: NewPlayer) -> Result<ApiPlayer, DbError> {
        let mut players = self.db.read_or_default(&Collection::PlayerInfo)?;
        let id = next_id(&Collection::PlayerInfo, players.last().map(|e| e.id))?;
        let player = new_player.into_player(id);

        players.push(player.clone());
        self.db.write(&Collection::PlayerInfo, &players)?;

        log::info!("[PLAYER] Created {} {}", player.id, player.name);
        Ok(player)
    }
}
