use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiCoach {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub history: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewCoach {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub history: Vec<Value>,
}

impl NewCoach {
    pub fn into_coach(self, id: i64) -> ApiCoach {
        ApiCoach { id, name: self.name, age: self.age, team: self.team, history: self.history }
    }
}

/// Partial update, absent fields keep their stored value.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CoachUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub team: Option<String>,
    pub history: Option<Vec<Value>>,
}

impl ApiCoach {
    pub fn apply(&mut self, update: CoachUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.age.is_some() {
            self.age = update.age;
        }
        if update.team.is_some() {
            self.team = update.team;
        }
        if let Some(history) = update.history {
            self.history = history;
        }
    }
}
