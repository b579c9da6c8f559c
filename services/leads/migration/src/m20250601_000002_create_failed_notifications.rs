use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to leads: the row carries its own copy of the lead fields.
        manager
            .create_table(
                Table::create()
                    .table(FailedNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FailedNotifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::LeadId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::LeadPublicId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::FirstName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::LastName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FailedNotifications::Email).string().not_null())
                    .col(
                        ColumnDef::new(FailedNotifications::Recipients)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::LastError)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::Status)
                            .string()
                            .not_null()
                            .default("FAILED"),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FailedNotifications::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(FailedNotifications::Table)
                    .col(FailedNotifications::CreatedAt)
                    .name("idx_failed_notifications_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FailedNotifications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FailedNotifications {
    Table,
    Id,
    LeadId,
    LeadPublicId,
    FirstName,
    LastName,
    Email,
    Recipients,
    LastError,
    Status,
    CreatedAt,
    UpdatedAt,
}
