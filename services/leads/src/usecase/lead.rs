use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use intake_domain::id::LeadPublicId;
use intake_domain::lead::LeadStatus;
use intake_domain::pagination::PageRequest;

use crate::domain::repository::{BlobStore, LeadRepository, NotificationQueue};
use crate::domain::types::{
    InsertLeadOutcome, Lead, LeadListFilter, MAX_PUBLIC_ID_ATTEMPTS, NewLead, NotificationJob,
    StatusUpdate, StoredResume,
};
use crate::domain::validation::ValidatedSubmission;
use crate::error::LeadsServiceError;

// ── CreateLead ───────────────────────────────────────────────────────────────

pub struct CreateLeadUseCase<L: LeadRepository, B: BlobStore, Q: NotificationQueue> {
    pub leads: L,
    pub blobs: B,
    pub queue: Q,
    pub staff_recipients: Arc<[String]>,
    pub new_public_id: fn() -> LeadPublicId,
}

impl<L: LeadRepository, B: BlobStore, Q: NotificationQueue> CreateLeadUseCase<L, B, Q> {
    /// Store the resume, insert the lead, then hand the staff notification to
    /// the dispatcher. Notification runs after this returns.
    ///
    /// A failed upload leaves nothing behind. A failed insert may leave an
    /// unreferenced blob but never a lead without its resume.
    pub async fn execute(
        &self,
        submission: ValidatedSubmission,
    ) -> Result<Lead, LeadsServiceError> {
        let resume_key = submission.resume.blob_key(Uuid::new_v4());
        self.blobs
            .put(&resume_key, submission.resume.data.clone())
            .await?;

        let created_at = Utc::now();
        for attempt in 1..=MAX_PUBLIC_ID_ATTEMPTS {
            let new_lead = NewLead {
                public_id: (self.new_public_id)(),
                first_name: submission.first_name.clone(),
                last_name: submission.last_name.clone(),
                email: submission.email.clone(),
                resume_key: resume_key.clone(),
                resume_content_type: submission.resume.content_type.to_owned(),
                created_at,
            };
            match self.leads.insert(&new_lead).await? {
                InsertLeadOutcome::Inserted(lead) => {
                    info!(lead_public_id = %lead.public_id, "lead created");
                    self.queue.enqueue(NotificationJob {
                        contact: lead.contact(),
                        recipients: self.staff_recipients.to_vec(),
                    });
                    return Ok(lead);
                }
                InsertLeadOutcome::PublicIdTaken => {
                    warn!(
                        lead_public_id = %new_lead.public_id,
                        attempt,
                        "public id collision; regenerating"
                    );
                }
            }
        }
        Err(anyhow::anyhow!("no free public id after {MAX_PUBLIC_ID_ATTEMPTS} attempts").into())
    }
}

// ── GetLead ──────────────────────────────────────────────────────────────────

pub struct GetLeadUseCase<L: LeadRepository> {
    pub leads: L,
}

impl<L: LeadRepository> GetLeadUseCase<L> {
    pub async fn execute(&self, public_id: LeadPublicId) -> Result<Lead, LeadsServiceError> {
        self.leads
            .find_by_public_id(public_id)
            .await?
            .ok_or(LeadsServiceError::LeadNotFound)
    }
}

// ── ListLeads ────────────────────────────────────────────────────────────────

pub struct ListLeadsUseCase<L: LeadRepository> {
    pub leads: L,
}

impl<L: LeadRepository> ListLeadsUseCase<L> {
    pub async fn execute(
        &self,
        filter: LeadListFilter,
        page: PageRequest,
    ) -> Result<Vec<Lead>, LeadsServiceError> {
        self.leads.list(filter, page.clamped()).await
    }
}

// ── SetLeadStatus ────────────────────────────────────────────────────────────

pub struct SetLeadStatusUseCase<L: LeadRepository> {
    pub leads: L,
}

impl<L: LeadRepository> SetLeadStatusUseCase<L> {
    /// Re-setting the current status succeeds and still bumps `updated_at`.
    pub async fn execute(
        &self,
        public_id: LeadPublicId,
        status: LeadStatus,
    ) -> Result<Lead, LeadsServiceError> {
        match self.leads.update_status(public_id, status, Utc::now()).await? {
            StatusUpdate::Updated(lead) => {
                info!(lead_public_id = %public_id, status = %status, "lead status set");
                Ok(lead)
            }
            StatusUpdate::NotFound => Err(LeadsServiceError::LeadNotFound),
            StatusUpdate::Rejected => Err(LeadsServiceError::InvalidStatusTransition),
        }
    }
}

// ── DownloadResume ───────────────────────────────────────────────────────────

pub struct DownloadResumeUseCase<L: LeadRepository, B: BlobStore> {
    pub leads: L,
    pub blobs: B,
}

impl<L: LeadRepository, B: BlobStore> DownloadResumeUseCase<L, B> {
    pub async fn execute(
        &self,
        public_id: LeadPublicId,
    ) -> Result<StoredResume, LeadsServiceError> {
        let lead = self
            .leads
            .find_by_public_id(public_id)
            .await?
            .ok_or(LeadsServiceError::LeadNotFound)?;
        let data = self
            .blobs
            .get(&lead.resume_key)
            .await?
            .ok_or(LeadsServiceError::ResumeNotFound)?;
        Ok(StoredResume {
            data,
            content_type: lead.resume_content_type,
        })
    }
}
