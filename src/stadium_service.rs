use std::path::Path;

use crate::{db::{Db, DbError}, models::Collection, models_api::stadium::{ApiStadium, StadiumsPayload}};

pub struct StadiumService {
    db: Db<Collection, StadiumsPayload>,
}

impl StadiumService {
    pub fn new(root: impl AsRef<Path>) -> StadiumService {
        StadiumService { db: Db::new(root) }
    }

    /// The file may hold either `{ "stadiums": [..] }` or a bare list.
    pub fn read(&self) -> Result<Option<Vec<ApiStadium>>, DbError> {
        Ok(self.db.read(&Collection::Stadiums)?.map(|e| e.into()))
    }
}
