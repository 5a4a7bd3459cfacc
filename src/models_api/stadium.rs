use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiStadium {
    pub id: i64,
    pub name: String,
    pub team: String,
    pub location: String,
    pub capacity: u32,
    pub opened: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StadiumsRsp {
    pub stadiums: Vec<ApiStadium>,
}

/// Older deployments answer with a bare array instead of the wrapped object.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum StadiumsPayload {
    Wrapped(StadiumsRsp),
    Bare(Vec<ApiStadium>),
}

impl From<StadiumsPayload> for Vec<ApiStadium> {
    fn from(v: StadiumsPayload) -> Self {
        match v {
            StadiumsPayload::Wrapped(rsp) => rsp.stadiums,
            StadiumsPayload::Bare(stadiums) => stadiums,
        }
    }
}
