use sea_orm::entity::prelude::*;

/// A prospect's application.
/// `id` never leaves the service; clients only ever see `public_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub public_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Object-store key of the uploaded resume.
    pub resume_key: String,
    pub resume_content_type: String,
    /// `PENDING` | `REACHED_OUT`
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
