//! Pure checks on an intake submission. No I/O, no side effects.

use bytes::Bytes;
use uuid::Uuid;

/// Reason a submission was rejected. `Display` is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} is too long")]
    FieldTooLong(&'static str),
    #[error("email address is not well-formed")]
    InvalidEmail,
    #[error("file type is not allowed; expected pdf, doc, docx, txt or rtf")]
    DisallowedFileType,
    #[error("resume exceeds the {max} byte limit")]
    FileTooLarge { max: usize },
    #[error("resume is empty")]
    EmptyFile,
    #[error("malformed submission: {0}")]
    Malformed(String),
}

/// Raw multipart fields as received.
#[derive(Debug, Default)]
pub struct SubmissionInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub resume: Option<UploadedFile>,
}

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub resume: ValidatedResume,
}

#[derive(Debug, Clone)]
pub struct ValidatedResume {
    pub extension: &'static str,
    /// Canonical MIME type for the extension, not the client's declared one.
    pub content_type: &'static str,
    pub data: Bytes,
}

impl ValidatedResume {
    /// Blob key derived from a fresh identifier. The client filename never reaches storage.
    pub fn blob_key(&self, id: Uuid) -> String {
        format!("resumes/{id}.{}", self.extension)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionLimits {
    pub max_resume_bytes: usize,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            max_resume_bytes: 10 * 1024 * 1024,
        }
    }
}

const MAX_NAME_CHARS: usize = 100;
const MAX_EMAIL_CHARS: usize = 254;

/// (extension, canonical MIME type, accepted declared MIME types)
const ALLOWED_TYPES: &[(&str, &str, &[&str])] = &[
    ("pdf", "application/pdf", &["application/pdf"]),
    ("doc", "application/msword", &["application/msword"]),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
    ("txt", "text/plain", &["text/plain"]),
    ("rtf", "application/rtf", &["application/rtf", "text/rtf"]),
];

/// Validate a submission, reporting the first failing rule.
///
/// Order: first name, last name, email, resume presence, file type, size.
pub fn validate_submission(
    input: SubmissionInput,
    limits: &SubmissionLimits,
) -> Result<ValidatedSubmission, ValidationError> {
    let first_name = required_text(input.first_name, "first_name", MAX_NAME_CHARS)?;
    let last_name = required_text(input.last_name, "last_name", MAX_NAME_CHARS)?;
    let email = required_text(input.email, "email", MAX_EMAIL_CHARS)?;
    if !is_valid_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }

    let file = input.resume.ok_or(ValidationError::MissingField("resume"))?;
    let (extension, content_type) =
        allowed_type(file.file_name.as_deref(), file.content_type.as_deref())
            .ok_or(ValidationError::DisallowedFileType)?;
    if file.data.len() > limits.max_resume_bytes {
        return Err(ValidationError::FileTooLarge {
            max: limits.max_resume_bytes,
        });
    }
    if file.data.is_empty() {
        return Err(ValidationError::EmptyFile);
    }

    Ok(ValidatedSubmission {
        first_name,
        last_name,
        email,
        resume: ValidatedResume {
            extension,
            content_type,
            data: file.data,
        },
    })
}

fn required_text(
    value: Option<String>,
    field: &'static str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::FieldTooLong(field));
    }
    Ok(trimmed.to_owned())
}

/// Resolve the file's type from its name, cross-checked against the declared type.
///
/// A missing or `application/octet-stream` declaration defers to the extension.
fn allowed_type(
    file_name: Option<&str>,
    declared: Option<&str>,
) -> Option<(&'static str, &'static str)> {
    let name = file_name?;
    // Only the final path component counts; clients may send full paths.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (_, ext) = base.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let (extension, canonical, accepted) = ALLOWED_TYPES.iter().find(|(e, _, _)| *e == ext)?;

    let declared = declared
        .map(|d| d.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();
    if declared.is_empty() || declared == "application/octet-stream" {
        return Some((*extension, *canonical));
    }
    accepted
        .iter()
        .any(|a| *a == declared)
        .then_some((*extension, *canonical))
}

/// Syntactic email check: `local@domain.tld`, no whitespace, dot-separated
/// domain labels of letters, digits and inner hyphens, alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    labels_ok && tld_ok
}
