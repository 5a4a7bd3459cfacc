use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGame {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub score: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GamesRsp {
    pub result: Vec<ApiGame>,
}
