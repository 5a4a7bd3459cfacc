use std::path::Path;

use crate::{db::{Db, DbError}, models::Collection, models_api::game::ApiGame};

pub struct GameService {
    db: Db<Collection, Vec<ApiGame>>,
}

impl GameService {
    pub fn new(root: impl AsRef<Path>) -> GameService {
        GameService { db: Db::new(root) }
    }

    pub fn read(&self) -> Result<Option<Vec<ApiGame>>, DbError> {
        self.db.read(&Collection::Games)
    }
}
