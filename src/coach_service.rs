use std::{path::Path, sync::Arc};

use tokio::sync::RwLock;
use tracing::log;

use crate::{db::{next_id, Db, DbError}, models::Collection, models_api::coach::{ApiCoach, CoachUpdate, NewCoach}};

pub struct CoachService {
    db: Db<Collection, Vec<ApiCoach>>,
}
pub type SafeCoachService = Arc<RwLock<CoachService>>;

impl CoachService {
    pub fn new(root: impl AsRef<Path>) -> SafeCoachService {
        Arc::new(RwLock::new(CoachService { db: Db::new(root) }))
    }

    pub fn read_all(&self) -> Result<Option<Vec<ApiCoach>>, DbError> {
        self.db.read(&Collection::Coaches)
    }

    pub fn read(&self, id: i64) -> Result<Option<ApiCoach>, DbError> {
        Ok(self.read_all()?.unwrap_or_default().into_iter().find(|e| e.id == id))
    }

    pub fn create(&mut self, new_coach: NewCoach) -> Result<ApiCoach, DbError> {
        let mut coaches = self.db.read_or_default(&Collection::Coaches)?;
        let id = next_id(&Collection::Coaches, coaches.last().map(|e| e.id))?;
        let coach = new_coach.into_coach(id);

        coaches.push(coach.clone());
        self.db.write(&Collection::Coaches, &coaches)?;

        log::info!("[COACH] Created {} {}", coach.id, coach.name);
        Ok(coach)
    }

    /// `Ok(None)` when no coach has `id`.
    pub fn update(&mut self, id: i64, update: CoachUpdate) -> Result<Option<ApiCoach>, DbError> {
        let mut coaches = self.db.read_or_default(&Collection::Coaches)?;
        let updated = match coaches.iter_mut().find(|e| e.id == id) {
            Some(coach) => {
                coach.apply(update);
                coach.clone()
            },
            None => return Ok(None),
        };
        self.db.write(&Collection::Coaches, &coaches)?;

        log::info!("[COACH] Updated {id}");
        Ok(Some(updated))
    }

    /// `Ok(false)` when no coach has `id`.
    pub fn delete(&mut self, id: i64) -> Result<bool, DbError> {
        let mut coaches = self.db.read_or_default(&Collection::Coaches)?;
        let before = coaches.len();
        coaches.retain(|e| e.id != id);
        if coaches.len() == before {
            return Ok(false);
        }
        self.db.write(&Collection::Coaches, &coaches)?;

        log::info!("[COACH] Deleted {id}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempdir::TempDir;

    use crate::{db::DbError, models_api::coach::{CoachUpdate, NewCoach}};

    use super::CoachService;

    fn new_coach(name: &str, team: &str) -> NewCoach {
        NewCoach { name: name.to_string(), age: None, team: Some(team.to_string()), history: vec![] }
    }

    #[tokio::test]
    async fn missing_collection_reads_as_none() {
        let dir = TempDir::new("coach_service").expect("dir to be created");
        let service = CoachService::new(dir.path());

        assert!(service.read().await.read_all().unwrap().is_none());
        assert!(service.read().await.read(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn create_update_delete() {
        let dir = TempDir::new("coach_service").expect("dir to be created");
        let service = CoachService::new(dir.path());

        let spoelstra = service.write().await.create(new_coach("Erik Spoelstra", "Heat")).unwrap();
        let kerr = service.write().await.create(new_coach("Steve Kerr", "Warriors")).unwrap();
        assert_eq!((spoelstra.id, kerr.id), (1, 2));

        let update = CoachUpdate { age: Some(58), history: Some(vec![json!({ "team": "Warriors", "titles": 4 })]), ..Default::default() };
        let updated = service.write().await.update(2, update).unwrap().unwrap();
        assert_eq!(updated.name, "Steve Kerr");
        assert_eq!(updated.age, Some(58));
        assert_eq!(updated.team.as_deref(), Some("Warriors"));
        assert_eq!(updated.history.len(), 1);
        assert_eq!(service.read().await.read(2).unwrap(), Some(updated));

        assert!(service.write().await.update(99, CoachUpdate::default()).unwrap().is_none());

        assert!(service.write().await.delete(1).unwrap());
        assert!(!service.write().await.delete(1).unwrap());
        let remaining = service.read().await.read_all().unwrap().unwrap();
        assert_eq!(remaining.iter().map(|e| e.id).collect::<Vec<i64>>(), vec![2]);
    }

    #[tokio::test]
    async fn create_fails_when_ids_run_out() {
        let dir = TempDir::new("coach_service").expect("dir to be created");
        std::fs::write(dir.path().join("coaches.json"), format!(r#"[{{ "id": {}, "name": "Gregg Popovich" }}]"#, i64::MAX)).unwrap();
        let service = CoachService::new(dir.path());

        let result = service.write().await.create(new_coach("Mitch Johnson", "Spurs"));

        assert!(matches!(result, Err(DbError::IdsExhausted { last: i64::MAX, .. })));
        assert_eq!(service.read().await.read_all().unwrap().unwrap().len(), 1);
    }
}
