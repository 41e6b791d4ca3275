use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Application: index on owner_id for the owner-scoped list
        manager
            .create_index(
                Index::create()
                    .name("idx_application_owner")
                    .table(Application::Table)
                    .col(Application::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Application: composite (owner_id, created_at) backing the
        // created-at-descending dashboard ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_application_owner_created")
                    .table(Application::Table)
                    .col(Application::OwnerId)
                    .col(Application::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_application_owner").table(Application::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_application_owner_created").table(Application::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Application { Table, OwnerId, CreatedAt }
