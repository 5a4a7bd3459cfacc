use serde::{Deserialize, Serialize};

/// Season averages for one player, the rows of the statistics table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiPlayerStat {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub position: String,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub games: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsRsp {
    pub player_stats: Vec<ApiPlayerStat>,
}
