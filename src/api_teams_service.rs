use std::path::Path;

use crate::{db::{Db, DbError}, models::{Collection, Conference}, models_api::team::ApiTeam};

pub struct ApiTeamsService {
    db: Db<Collection, Vec<ApiTeam>>,
}

impl ApiTeamsService {
    pub fn new(root: impl AsRef<Path>) -> ApiTeamsService {
        ApiTeamsService { db: Db::new(root) }
    }

    pub fn read(&self) -> Result<Option<Vec<ApiTeam>>, DbError> {
        self.db.read(&Collection::Teams)
    }
}

/// Case-insensitive substring search over team name and city.
/// An empty query keeps every team, in input order. Whitespace is part of the query.
pub fn filter_teams<'a>(teams: &'a [ApiTeam], query: &str) -> Vec<&'a ApiTeam> {
    let query = query.to_lowercase();
    teams.iter()
        .filter(|e| query.is_empty()
            || e.name.to_lowercase().contains(&query)
            || e.city.to_lowercase().contains(&query))
        .collect()
}

/// Eastern first, then Western; input order is kept inside each group.
pub fn group_by_conference<'a>(teams: &[&'a ApiTeam]) -> Vec<(Conference, Vec<&'a ApiTeam>)> {
    Conference::get_all().into_iter()
        .map(|conference| {
            let members = teams.iter().copied().filter(|e| e.conference == conference).collect();
            (conference, members)
        })
        .collect()
}
