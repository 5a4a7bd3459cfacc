use serde::{Deserialize, Serialize};

fn not_available() -> String {
    "N/A".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerAverages {
    pub points_per_game: f64,
    pub assists_per_game: f64,
    pub rebounds_per_game: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlayer {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub team: String,

    #[serde(default = "not_available")]
    pub height: String,
    #[serde(default = "not_available")]
    pub weight: String,
    #[serde(default = "not_available")]
    pub birth_date: String,
    #[serde(default)]
    pub stats: PlayerAverages,
}

/// What `GET /api/player-info` exposes of a player.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiPlayerInfo {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub weight: String,
    pub height: String,
    pub position: String,
}

impl From<&ApiPlayer> for ApiPlayerInfo {
    fn from(p: &ApiPlayer) -> Self {
        ApiPlayerInfo {
            id: p.id,
            name: p.name.clone(),
            team: p.team.clone(),
            weight: p.weight.clone(),
            height: p.height.clone(),
            position: p.position.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub position: String,
    pub team: String,

    #[serde(default = "not_available")]
    pub height: String,
    #[serde(default = "not_available")]
    pub weight: String,
    #[serde(default = "not_available")]
    pub birth_date: String,
    #[serde(default)]
    pub stats: PlayerAverages,
}

impl NewPlayer {
    pub fn into_player(self, id: i64) -> ApiPlayer {
        ApiPlayer {
            id,
            name: self.name,
            position: self.position,
            team: self.team,
            height: self.height,
            weight: self.weight,
            birth_date: self.birth_date,
            stats: self.stats,
        }
    }
}
