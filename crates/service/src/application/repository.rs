use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Persistence abstraction over application rows. One row holds the whole
/// aggregate (embedded rounds/attachments), so `replace` is the only write
/// path for nested edits: load, mutate in memory, write the row back.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, app: models::application::Model) -> Result<models::application::Model, ServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<models::application::Model>, ServiceError>;
    /// All applications for one owner, most recently created first.
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<models::application::Model>, ServiceError>;
    async fn replace(&self, app: models::application::Model) -> Result<models::application::Model, ServiceError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockApplicationRepository {
        apps: Mutex<HashMap<Uuid, models::application::Model>>,
    }

    #[async_trait]
    impl ApplicationRepository for MockApplicationRepository {
        async fn insert(&self, app: models::application::Model) -> Result<models::application::Model, ServiceError> {
            let mut apps = self.apps.lock().unwrap();
            apps.insert(app.id, app.clone());
            Ok(app)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<models::application::Model>, ServiceError> {
            let apps = self.apps.lock().unwrap();
            Ok(apps.get(&id).cloned())
        }

        async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<models::application::Model>, ServiceError> {
            let apps = self.apps.lock().unwrap();
            let mut owned: Vec<_> = apps.values().filter(|a| a.owner_id == owner_id).cloned().collect();
            owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(owned)
        }

        async fn replace(&self, app: models::application::Model) -> Result<models::application::Model, ServiceError> {
            let mut apps = self.apps.lock().unwrap();
            if !apps.contains_key(&app.id) {
                return Err(ServiceError::not_found("application"));
            }
            apps.insert(app.id, app.clone());
            Ok(app)
        }

        async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError> {
            let mut apps = self.apps.lock().unwrap();
            Ok(apps.remove(&id).is_some())
        }
    }
}
