use serde::{Deserialize, Serialize};

use crate::models::Conference;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiTeam {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub conference: Conference,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TeamsRsp {
    pub teams: Vec<ApiTeam>,
}
