use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, Order, PaginatorTrait as _, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait as _, SqlErr, TransactionError, TransactionTrait, sea_query::Expr,
};

use intake_domain::id::LeadPublicId;
use intake_domain::lead::{LeadStatus, NotificationStatus};
use intake_domain::pagination::{PageRequest, Sort};
use intake_leads_schema::{failed_notifications, leads};

use crate::domain::repository::{FailedNotificationRepository, LeadRepository};
use crate::domain::types::{
    FailedNotification, InsertLeadOutcome, Lead, LeadContact, LeadListFilter,
    NewFailedNotification, NewLead, RESEND_LEASE_SECS, ResendClaim, StatusUpdate,
};
use crate::error::LeadsServiceError;

// ── Lead repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLeadRepository {
    pub db: DatabaseConnection,
}

impl LeadRepository for DbLeadRepository {
    async fn insert(&self, lead: &NewLead) -> Result<InsertLeadOutcome, LeadsServiceError> {
        let lead = lead.clone();
        let result = self
            .db
            .transaction::<_, Option<leads::Model>, DbErr>(|txn| {
                Box::pin(async move {
                    let taken = leads::Entity::find()
                        .filter(leads::Column::PublicId.eq(lead.public_id.0))
                        .count(txn)
                        .await?;
                    if taken > 0 {
                        return Ok(None);
                    }
                    let model = leads::ActiveModel {
                        public_id: Set(lead.public_id.0),
                        first_name: Set(lead.first_name),
                        last_name: Set(lead.last_name),
                        email: Set(lead.email),
                        resume_key: Set(lead.resume_key),
                        resume_content_type: Set(lead.resume_content_type),
                        status: Set(LeadStatus::Pending.as_str().to_owned()),
                        created_at: Set(lead.created_at),
                        updated_at: Set(lead.created_at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                    Ok(Some(model))
                })
            })
            .await;

        match result {
            Ok(Some(model)) => Ok(InsertLeadOutcome::Inserted(lead_from_model(model)?)),
            Ok(None) => Ok(InsertLeadOutcome::PublicIdTaken),
            // Lost a race with a concurrent insert of the same public id.
            Err(TransactionError::Transaction(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Ok(InsertLeadOutcome::PublicIdTaken)
            }
            Err(e) => Err(anyhow::Error::from(e).context("insert lead").into()),
        }
    }

    async fn find_by_public_id(
        &self,
        public_id: LeadPublicId,
    ) -> Result<Option<Lead>, LeadsServiceError> {
        let model = leads::Entity::find()
            .filter(leads::Column::PublicId.eq(public_id.0))
            .one(&self.db)
            .await
            .context("find lead by public id")?;
        Ok(model.map(lead_from_model).transpose()?)
    }

    async fn list(
        &self,
        filter: LeadListFilter,
        page: PageRequest,
    ) -> Result<Vec<Lead>, LeadsServiceError> {
        let order = match filter.sort {
            Sort::Desc => Order::Desc,
            Sort::Asc => Order::Asc,
        };
        let models = leads::Entity::find()
            .apply_if(filter.status, |q, status| {
                q.filter(leads::Column::Status.eq(status.as_str()))
            })
            .order_by(leads::Column::CreatedAt, order.clone())
            .order_by(leads::Column::Id, order)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list leads")?;
        Ok(models
            .into_iter()
            .map(lead_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn update_status(
        &self,
        public_id: LeadPublicId,
        status: LeadStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdate, LeadsServiceError> {
        let result = leads::Entity::update_many()
            .col_expr(leads::Column::Status, Expr::value(status.as_str()))
            .col_expr(leads::Column::UpdatedAt, Expr::value(now))
            .filter(leads::Column::PublicId.eq(public_id.0))
            .filter(leads::Column::Status.is_in(status.allowed_from().map(LeadStatus::as_str)))
            .exec(&self.db)
            .await
            .context("update lead status")?;

        let model = leads::Entity::find()
            .filter(leads::Column::PublicId.eq(public_id.0))
            .one(&self.db)
            .await
            .context("find lead after status update")?;
        Ok(match (result.rows_affected, model) {
            (_, None) => StatusUpdate::NotFound,
            (0, Some(_)) => StatusUpdate::Rejected,
            (_, Some(model)) => StatusUpdate::Updated(lead_from_model(model)?),
        })
    }
}

fn lead_from_model(model: leads::Model) -> anyhow::Result<Lead> {
    Ok(Lead {
        id: model.id,
        public_id: LeadPublicId(model.public_id),
        status: model
            .status
            .parse::<LeadStatus>()
            .context("decode lead status")?,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        resume_key: model.resume_key,
        resume_content_type: model.resume_content_type,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Failed notification repository ───────────────────────────────────────────

#[derive(Clone)]
pub struct DbFailedNotificationRepository {
    pub db: DatabaseConnection,
}

impl FailedNotificationRepository for DbFailedNotificationRepository {
    async fn record(
        &self,
        notification: &NewFailedNotification,
    ) -> Result<FailedNotification, LeadsServiceError> {
        let contact = &notification.contact;
        let recipients =
            serde_json::to_value(&notification.recipients).context("encode recipients")?;
        let model = failed_notifications::ActiveModel {
            lead_id: Set(contact.lead_id),
            lead_public_id: Set(contact.public_id.0),
            first_name: Set(contact.first_name.clone()),
            last_name: Set(contact.last_name.clone()),
            email: Set(contact.email.clone()),
            recipients: Set(recipients),
            last_error: Set(notification.last_error.clone()),
            status: Set(NotificationStatus::Failed.as_str().to_owned()),
            created_at: Set(notification.created_at),
            updated_at: Set(notification.created_at),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .context("record failed notification")?;
        Ok(failed_notification_from_model(model)?)
    }

    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<Vec<FailedNotification>, LeadsServiceError> {
        let models = failed_notifications::Entity::find()
            .order_by_desc(failed_notifications::Column::CreatedAt)
            .order_by_desc(failed_notifications::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list failed notifications")?;
        Ok(models
            .into_iter()
            .map(failed_notification_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn claim_for_resend(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<ResendClaim, LeadsServiceError> {
        let failed = NotificationStatus::Failed.as_str();
        let pending = NotificationStatus::Pending.as_str();
        let lease_cutoff = now - Duration::seconds(RESEND_LEASE_SECS);

        let result = failed_notifications::Entity::update_many()
            .col_expr(failed_notifications::Column::Status, Expr::value(pending))
            .col_expr(failed_notifications::Column::UpdatedAt, Expr::value(now))
            .filter(failed_notifications::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(failed_notifications::Column::Status.eq(failed))
                    .add(
                        Condition::all()
                            .add(failed_notifications::Column::Status.eq(pending))
                            .add(failed_notifications::Column::UpdatedAt.lt(lease_cutoff)),
                    ),
            )
            .exec(&self.db)
            .await
            .context("claim failed notification")?;

        let model = failed_notifications::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find claimed failed notification")?;
        Ok(match (result.rows_affected, model) {
            (_, None) => ResendClaim::NotFound,
            (0, Some(_)) => ResendClaim::InProgress,
            (_, Some(model)) => ResendClaim::Claimed(failed_notification_from_model(model)?),
        })
    }

    async fn complete_resend(&self, id: i64) -> Result<bool, LeadsServiceError> {
        let result = failed_notifications::Entity::delete_many()
            .filter(failed_notifications::Column::Id.eq(id))
            .filter(
                failed_notifications::Column::Status.eq(NotificationStatus::Pending.as_str()),
            )
            .exec(&self.db)
            .await
            .context("delete resent notification")?;
        Ok(result.rows_affected > 0)
    }

    async fn release_failed(
        &self,
        id: i64,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<FailedNotification>, LeadsServiceError> {
        failed_notifications::Entity::update_many()
            .col_expr(
                failed_notifications::Column::Status,
                Expr::value(NotificationStatus::Failed.as_str()),
            )
            .col_expr(failed_notifications::Column::LastError, Expr::value(error))
            .col_expr(failed_notifications::Column::UpdatedAt, Expr::value(now))
            .filter(failed_notifications::Column::Id.eq(id))
            .filter(
                failed_notifications::Column::Status.eq(NotificationStatus::Pending.as_str()),
            )
            .exec(&self.db)
            .await
            .context("release failed notification")?;
        let model = failed_notifications::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find released failed notification")?;
        Ok(model.map(failed_notification_from_model).transpose()?)
    }

    async fn delete(&self, id: i64) -> Result<bool, LeadsServiceError> {
        let result = failed_notifications::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete failed notification")?;
        Ok(result.rows_affected > 0)
    }
}

fn failed_notification_from_model(
    model: failed_notifications::Model,
) -> anyhow::Result<FailedNotification> {
    Ok(FailedNotification {
        id: model.id,
        recipients: serde_json::from_value(model.recipients).context("decode recipients")?,
        status: model
            .status
            .parse::<NotificationStatus>()
            .context("decode notification status")?,
        contact: LeadContact {
            lead_id: model.lead_id,
            public_id: LeadPublicId(model.lead_public_id),
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        },
        last_error: model.last_error,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
