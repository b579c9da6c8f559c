use bytes::Bytes;
use chrono::{DateTime, Utc};

use intake_domain::id::LeadPublicId;
use intake_domain::lead::{LeadStatus, NotificationStatus};
use intake_domain::pagination::Sort;

/// A prospect's application.
#[derive(Debug, Clone)]
pub struct Lead {
    /// Internal sequential key; never serialized to clients.
    pub id: i64,
    pub public_id: LeadPublicId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub resume_key: String,
    pub resume_content_type: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn contact(&self) -> LeadContact {
        LeadContact {
            lead_id: self.id,
            public_id: self.public_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Lead row to insert. The internal id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub public_id: LeadPublicId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub resume_key: String,
    pub resume_content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a lead insert attempt.
#[derive(Debug)]
pub enum InsertLeadOutcome {
    Inserted(Lead),
    /// Another lead already owns the generated public id; nothing was written.
    PublicIdTaken,
}

/// Result of a conditional status write.
#[derive(Debug)]
pub enum StatusUpdate {
    Updated(Lead),
    NotFound,
    /// The stored status may not move to the requested one; nothing was written.
    Rejected,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LeadListFilter {
    pub status: Option<LeadStatus>,
    pub sort: Sort,
}

/// Lead fields a notification needs, copied so delivery does not re-read the lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadContact {
    pub lead_id: i64,
    pub public_id: LeadPublicId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl LeadContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Work item handed to the dispatcher once a lead is committed.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub contact: LeadContact,
    /// Staff recipients, order preserved, duplicates kept.
    pub recipients: Vec<String>,
}

/// Staff notification parked after its automatic retries ran out.
#[derive(Debug, Clone)]
pub struct FailedNotification {
    pub id: i64,
    pub contact: LeadContact,
    pub recipients: Vec<String>,
    pub last_error: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFailedNotification {
    pub contact: LeadContact,
    pub recipients: Vec<String>,
    pub last_error: String,
    pub created_at: DateTime<Utc>,
}

/// Result of trying to take a failed notification for a manual resend.
#[derive(Debug)]
pub enum ResendClaim {
    /// The row moved `FAILED -> PENDING` and belongs to this caller.
    Claimed(FailedNotification),
    /// Another resend holds the row.
    InProgress,
    NotFound,
}

/// What an administrator's resend achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    /// Delivered; the failure record is gone.
    Sent,
    /// Delivery failed again; the record keeps its id with the new error.
    StillFailing { error: String },
}

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Any non-success from the mail transport. The detail is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

/// Resume bytes read back from the blob store.
#[derive(Debug, Clone)]
pub struct StoredResume {
    pub data: Bytes,
    pub content_type: String,
}

/// Attempts at inserting a lead before giving up on public-id collisions.
pub const MAX_PUBLIC_ID_ATTEMPTS: u32 = 3;

/// A `PENDING` failure row older than this is treated as an abandoned resend.
pub const RESEND_LEASE_SECS: i64 = 300;
