use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::application::repository::ApplicationRepository;
use crate::errors::ServiceError;
use models::application;

/// SeaORM-backed repository implementation. A full-row UPDATE is the
/// atomicity unit; nested JSONB edits ride along with it.
pub struct SeaOrmApplicationRepository {
    pub db: DatabaseConnection,
}

fn to_active(app: application::Model) -> application::ActiveModel {
    application::ActiveModel {
        id: Set(app.id),
        owner_id: Set(app.owner_id),
        company_name: Set(app.company_name),
        role: Set(app.role),
        status: Set(app.status),
        notes: Set(app.notes),
        rounds: Set(app.rounds),
        attachments: Set(app.attachments),
        created_at: Set(app.created_at),
        updated_at: Set(app.updated_at),
    }
}

#[async_trait::async_trait]
impl ApplicationRepository for SeaOrmApplicationRepository {
    async fn insert(&self, app: application::Model) -> Result<application::Model, ServiceError> {
        to_active(app)
            .insert(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<application::Model>, ServiceError> {
        application::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<application::Model>, ServiceError> {
        application::Entity::find()
            .filter(application::Column::OwnerId.eq(owner_id))
            .order_by_desc(application::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn replace(&self, app: application::Model) -> Result<application::Model, ServiceError> {
        to_active(app).update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => ServiceError::not_found("application"),
            other => ServiceError::Db(other.to_string()),
        })
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = application::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }
}
