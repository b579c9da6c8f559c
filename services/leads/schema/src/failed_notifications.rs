use sea_orm::entity::prelude::*;

/// Staff notification that exhausted its automatic retries.
/// Lead fields are copied at failure time so a resend does not depend on the lead row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "failed_notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lead_id: i64,
    pub lead_public_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// JSON array of recipient addresses, order preserved.
    pub recipients: Json,
    pub last_error: String,
    /// `FAILED` | `PENDING` (resend in flight)
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
