use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The flat-file collections served by the api, one JSON list each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Games,
    Teams,
    Stadiums,
    PlayerInfo,
    PlayerStats,
    Coaches,
}

impl Collection {
    pub fn get_all() -> Vec<Collection> {
        vec![Collection::Games, Collection::Teams, Collection::Stadiums, Collection::PlayerInfo, Collection::PlayerStats, Collection::Coaches]
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Collection::Games => "nba-games",
            Collection::Teams => "teams",
            Collection::Stadiums => "stadiums",
            Collection::PlayerInfo => "player-info",
            Collection::PlayerStats => "player-stats",
            Collection::Coaches => "coaches",
        };
        write!(f, "{name}")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conference {
    Eastern,
    Western,
}

impl Conference {
    pub fn get_all() -> Vec<Conference> {
        vec![Conference::Eastern, Conference::Western]
    }
}

impl Display for Conference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
