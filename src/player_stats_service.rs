use std::path::Path;

use crate::{db::{Db, DbError}, models::Collection, models_api::player_stats::ApiPlayerStat};

pub struct PlayerStatsService {
    db: Db<Collection, Vec<ApiPlayerStat>>,
}

impl PlayerStatsService {
    pub fn new(root: impl AsRef<Path>) -> PlayerStatsService {
        PlayerStatsService { db: Db::new(root) }
    }

    pub fn read(&self) -> Result<Option<Vec<ApiPlayerStat>>, DbError> {
        self.db.read(&Collection::PlayerStats)
    }
}
