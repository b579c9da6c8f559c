use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Leads::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Leads::PublicId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Leads::FirstName).string().not_null())
                    .col(ColumnDef::new(Leads::LastName).string().not_null())
                    .col(ColumnDef::new(Leads::Email).string().not_null())
                    .col(ColumnDef::new(Leads::ResumeKey).string().not_null())
                    .col(ColumnDef::new(Leads::ResumeContentType).string().not_null())
                    .col(
                        ColumnDef::new(Leads::Status)
                            .string()
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Leads::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Leads::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Leads::Table)
                    .col(Leads::Email)
                    .name("idx_leads_email")
                    .to_owned(),
            )
            .await?;

        // Listing is newest first, optionally filtered by status.
        manager
            .create_index(
                Index::create()
                    .table(Leads::Table)
                    .col(Leads::Status)
                    .col(Leads::CreatedAt)
                    .name("idx_leads_status_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Leads {
    Table,
    Id,
    PublicId,
    FirstName,
    LastName,
    Email,
    ResumeKey,
    ResumeContentType,
    Status,
    CreatedAt,
    UpdatedAt,
}
