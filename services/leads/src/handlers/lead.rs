use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use intake_auth_types::identity::IdentityHeaders;
use intake_domain::id::LeadPublicId;
use intake_domain::lead::LeadStatus;
use intake_domain::pagination::{PageRequest, Sort};

use crate::domain::repository::AdmissionControl as _;
use crate::domain::types::{Admission, Lead, LeadListFilter};
use crate::domain::validation::{
    SubmissionInput, SubmissionLimits, UploadedFile, ValidationError, validate_submission,
};
use crate::error::LeadsServiceError;
use crate::handlers::client::ClientKey;
use crate::state::AppState;
use crate::usecase::lead::{
    CreateLeadUseCase, DownloadResumeUseCase, GetLeadUseCase, ListLeadsUseCase,
    SetLeadStatusUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

/// Client view of a lead. The internal id and blob key stay server-side.
#[derive(Serialize)]
pub struct LeadResponse {
    pub public_id: LeadPublicId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: LeadStatus,
    #[serde(serialize_with = "intake_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "intake_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            public_id: lead.public_id,
            first_name: lead.first_name,
            last_name: lead.last_name,
            email: lead.email,
            status: lead.status,
            created_at: lead.created_at,
            updated_at: lead.updated_at,
        }
    }
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct LeadListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Deserialize)]
pub struct SetLeadStatusRequest {
    pub status: LeadStatus,
}

// ── POST /leads ──────────────────────────────────────────────────────────────

pub async fn create_lead(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
    multipart: Multipart,
) -> Result<(StatusCode, Json<LeadResponse>), LeadsServiceError> {
    if state.admission.admit(&client_key).await == Admission::Denied {
        tracing::warn!(client_key = %client_key, "lead submission rate limited");
        return Err(LeadsServiceError::RateLimited);
    }

    let input = read_submission(multipart, &state.limits).await?;
    let submission = validate_submission(input, &state.limits)?;

    let uc = CreateLeadUseCase {
        leads: state.lead_repo(),
        blobs: state.blobs.clone(),
        queue: state.queue.clone(),
        staff_recipients: state.staff_recipients.clone(),
        new_public_id: LeadPublicId::generate,
    };
    let lead = uc.execute(submission).await?;
    Ok((StatusCode::CREATED, Json(lead.into())))
}

/// Collect the known multipart fields. Unknown fields are ignored.
///
/// Resume bytes are read up to one byte past the ceiling so the validator can
/// report the size rule without buffering an arbitrarily large upload.
async fn read_submission(
    mut multipart: Multipart,
    limits: &SubmissionLimits,
) -> Result<SubmissionInput, ValidationError> {
    let mut input = SubmissionInput::default();
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limits))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("first_name") => input.first_name = Some(field_text(field, limits).await?),
            Some("last_name") => input.last_name = Some(field_text(field, limits).await?),
            Some("email") => input.email = Some(field_text(field, limits).await?),
            Some("resume") => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let mut data = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, limits))?
                {
                    data.extend_from_slice(&chunk);
                    if data.len() > limits.max_resume_bytes {
                        data.truncate(limits.max_resume_bytes + 1);
                        break;
                    }
                }
                input.resume = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.freeze(),
                });
            }
            _ => {}
        }
    }
    Ok(input)
}

async fn field_text(
    field: axum::extract::multipart::Field<'_>,
    limits: &SubmissionLimits,
) -> Result<String, ValidationError> {
    field.text().await.map_err(|e| multipart_error(e, limits))
}

fn multipart_error(e: MultipartError, limits: &SubmissionLimits) -> ValidationError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::FileTooLarge {
            max: limits.max_resume_bytes,
        }
    } else {
        ValidationError::Malformed(e.body_text())
    }
}

// ── GET /leads ───────────────────────────────────────────────────────────────

pub async fn list_leads(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Query(query): Query<LeadListQuery>,
) -> Result<Json<Vec<LeadResponse>>, LeadsServiceError> {
    if !identity.is_staff() {
        return Err(LeadsServiceError::Forbidden);
    }
    let status = query
        .status
        .as_deref()
        .map(str::parse::<LeadStatus>)
        .transpose()
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let sort = query
        .sort_by
        .as_deref()
        .and_then(Sort::from_created_at_kebab)
        .unwrap_or_default();
    let page = PageRequest::from_query(query.per_page, query.page);

    let uc = ListLeadsUseCase {
        leads: state.lead_repo(),
    };
    let leads = uc.execute(LeadListFilter { status, sort }, page).await?;
    Ok(Json(leads.into_iter().map(Into::into).collect()))
}

// ── GET /leads/{public_id} ───────────────────────────────────────────────────

pub async fn get_lead(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Json<LeadResponse>, LeadsServiceError> {
    if !identity.is_staff() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = GetLeadUseCase {
        leads: state.lead_repo(),
    };
    let lead = uc.execute(parse_public_id(&public_id)?).await?;
    Ok(Json(lead.into()))
}

// ── PUT /leads/{public_id}/status ────────────────────────────────────────────

pub async fn set_lead_status(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Json(body): Json<SetLeadStatusRequest>,
) -> Result<Json<LeadResponse>, LeadsServiceError> {
    if !identity.is_staff() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = SetLeadStatusUseCase {
        leads: state.lead_repo(),
    };
    let lead = uc
        .execute(parse_public_id(&public_id)?, body.status)
        .await?;
    Ok(Json(lead.into()))
}

// ── GET /leads/{public_id}/resume ────────────────────────────────────────────

pub async fn download_resume(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<Response, LeadsServiceError> {
    if !identity.is_staff() {
        return Err(LeadsServiceError::Forbidden);
    }
    let uc = DownloadResumeUseCase {
        leads: state.lead_repo(),
        blobs: state.blobs.clone(),
    };
    let resume = uc.execute(parse_public_id(&public_id)?).await?;
    Ok((
        [
            (header::CONTENT_TYPE, resume.content_type),
            (header::CONTENT_DISPOSITION, "attachment".to_owned()),
        ],
        resume.data,
    )
        .into_response())
}

/// A malformed id cannot name a lead, so it reads as not found.
fn parse_public_id(raw: &str) -> Result<LeadPublicId, LeadsServiceError> {
    raw.parse().map_err(|_| LeadsServiceError::LeadNotFound)
}
