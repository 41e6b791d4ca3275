//! Create `application` table with FK to `user`.
//!
//! Rounds and attachments are embedded JSONB documents on the row itself,
//! so deleting an application removes them with it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Application::Table)
                    .if_not_exists()
                    .col(uuid(Application::Id).primary_key())
                    .col(uuid(Application::OwnerId).not_null())
                    .col(string_len(Application::CompanyName, 255).not_null())
                    .col(string_len(Application::Role, 255).not_null())
                    .col(string_len(Application::Status, 32).not_null())
                    .col(
                        ColumnDef::new(Application::Notes)
                            .text()
                            .null(),
                    )
                    .col(json_binary(Application::Rounds).not_null())
                    .col(json_binary(Application::Attachments).not_null())
                    .col(timestamp_with_time_zone(Application::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Application::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_application_owner")
                            .from(Application::Table, Application::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Application::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Application {
    Table,
    Id,
    OwnerId,
    CompanyName,
    Role,
    Status,
    Notes,
    Rounds,
    Attachments,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
